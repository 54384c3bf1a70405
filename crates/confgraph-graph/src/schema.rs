/// Schema description of the conference graph, included verbatim in the
/// natural-language-to-Cypher prompt.
pub const SCHEMA_TEXT: &str = "Schema Information: \
Speaker nodes have properties: name, bio, company, job_title \
Company nodes have a property: name \
JobTitle nodes have a property: title \
Session nodes have properties: title, id, duration, alias \
Type, Level, Category, Track, and Delivery nodes have a property: name \
Relationships: \
(:Speaker)-[:WORKS_FOR]->(:Company) \
(:Speaker)-[:HAS_JOB_TITLE]->(:JobTitle) \
(:Speaker)-[:SPEAKS_AT]->(:Session) \
(:Session)-[:HAS_TYPE]->(:Type) \
(:Session)-[:HAS_LEVEL]->(:Level) \
(:Session)-[:BELONGS_TO_CATEGORY]->(:Category) \
(:Session)-[:BELONGS_TO_TRACK]->(:Track) \
(:Session)-[:HAS_DELIVERY]->(:Delivery)";

//! Pure prompt builders for the three completion calls.
//!
//! Each builder rejects empty required inputs and omits optional sections
//! entirely instead of substituting blank text. Output is deterministic for
//! identical inputs and never contains unfilled placeholder markers.

use confgraph_core::{ConfGraphError, Result};

/// Delimiter used to join retrieved passages into one context string.
pub const CONTEXT_DELIMITER: &str = ";";

/// Fallback reply appended when every pipeline stage failed.
pub const FALLBACK_ANSWER: &str =
    "I'm sorry, I wasn't able to find an answer to that right now. Please try again.";

fn require(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfGraphError::Prompt(format!("{} must not be empty", name)));
    }
    Ok(())
}

/// Prompt asking the model to answer from vector-search context.
///
/// The context section is omitted when no passages were retrieved; the model
/// then answers from the few-shot examples and its own knowledge.
pub fn retrieval_answer_prompt(question: &str, contexts: &[String]) -> Result<String> {
    require(question, "question")?;

    let mut prompt = String::from(
        "You are an AI assistant with expertise in the Data + AI Summit 2024 by Databricks. \
         Given an input question, use the provided context to generate a comprehensive and \
         accurate response.\n\n",
    );

    if !contexts.is_empty() {
        let joined = contexts.join(CONTEXT_DELIMITER);
        prompt.push_str(&format!(
            "Here is the context information retrieved from the vector database:\n{}\n\n",
            joined
        ));
    }

    prompt.push_str(
        "Below are a number of examples of questions and their corresponding responses based \
         on the context.\n\n\
         User input: Who are the speakers for the session titled \"Simplify GenAI App Development with Secure, Custom AI Agents\"?\n\
         Context: The session \"Simplify GenAI App Development with Secure, Custom AI Agents\" is presented by Aakrati Talati.\n\
         Response: The speakers for the session titled \"Simplify GenAI App Development with Secure, Custom AI Agents\" include Aakrati Talati.\n\n\
         User input: What topics will be covered in the session \"The AI Regulatory Landscape: What's Here? What's Coming? How to Prepare?\"?\n\
         Context: The session \"The AI Regulatory Landscape: What's Here? What's Coming? How to Prepare?\" covers topics such as AI/Machine Learning, GenAI/LLMs, and Data Governance.\n\
         Response: The session \"The AI Regulatory Landscape: What's Here? What's Coming? How to Prepare?\" will cover topics including AI/Machine Learning, GenAI/LLMs, and Data Governance.\n\n\
         User input: Which companies are represented by speakers in the \"Generative AI\" track?\n\
         Context: The \"Generative AI\" track includes speakers from companies such as Databricks and OpenAI.\n\
         Response: The companies represented by speakers in the \"Generative AI\" track include Databricks and OpenAI.\n\n",
    );

    prompt.push_str(&format!("User input: {}\n", question));
    prompt.push_str("Response:");

    Ok(prompt)
}

/// Prompt asking the model to translate the question into a Cypher query.
///
/// The expected completion is a single executable query with no surrounding
/// commentary; an optional context hint from an earlier completion narrows
/// the translation.
pub fn graph_query_prompt(
    question: &str,
    schema_text: &str,
    prior_context: Option<&str>,
) -> Result<String> {
    require(question, "question")?;
    require(schema_text, "schema text")?;

    let mut prompt = String::from(
        "You are a Neo4j expert. Given an input question, create a syntactically correct \
         Cypher query to run.\n\
         Here is the schema information:\n",
    );
    prompt.push_str(schema_text);
    prompt.push_str(
        "\n\nBelow are a number of examples of questions and their corresponding Cypher queries.\n\n\
         User input: How many speakers are there?\n\
         Cypher query: MATCH (s:Speaker) RETURN count(DISTINCT s)\n\n\
         User input: Which speakers are presenting in the session titled 'Simplify GenAI App Development with Secure, Custom AI Agents'?\n\
         Cypher query: MATCH (s:Session {title: 'Simplify GenAI App Development with Secure, Custom AI Agents'})<-[:SPEAKS_AT]-(sp:Speaker) RETURN sp.name\n\n\
         User input: How many sessions is Aakrati Talati speaking at?\n\
         Cypher query: MATCH (sp:Speaker {name: 'Aakrati Talati'})-[:SPEAKS_AT]->(s:Session) RETURN count(s)\n\n\
         User input: List all the categories of the session titled 'The AI Regulatory Landscape: What’s Here? What’s Coming? How to Prepare?'\n\
         Cypher query: MATCH (s:Session {title: 'The AI Regulatory Landscape: What’s Here? What’s Coming? How to Prepare?'})-[:BELONGS_TO_CATEGORY]->(c:Category) RETURN c.name\n\n\
         User input: Which speakers are involved in sessions from both the 'Generative AI' and 'Data Governance' tracks?\n\
         Cypher query: MATCH (sp:Speaker)-[:SPEAKS_AT]->(s1:Session)-[:BELONGS_TO_TRACK]->(t1:Track {name: 'Generative AI'}) MATCH (sp)-[:SPEAKS_AT]->(s2:Session)-[:BELONGS_TO_TRACK]->(t2:Track {name: 'Data Governance'}) RETURN sp.name\n\n",
    );

    prompt.push_str(&format!("User input: {}\n", question));
    if let Some(context) = prior_context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("Context: {}\n", context));
    }
    prompt.push_str("Cypher query:\n\nEMIT ONLY CODE WITHOUT ANY FORMATTING");

    Ok(prompt)
}

/// Prompt asking the model to synthesize the final answer from graph query
/// results.
pub fn final_answer_prompt(question: &str, rendered_records: &str) -> Result<String> {
    require(question, "question")?;

    let mut prompt = String::from(
        "You are an AI assistant. Given an input question and the results of a Neo4j query, \
         synthesize a final response to answer the user's question.\n",
    );
    prompt.push_str(&format!("User question: {}\n", question));
    prompt.push_str("Neo4j query results:\n");
    if rendered_records.trim().is_empty() {
        prompt.push_str("(the query returned no results)\n");
    } else {
        prompt.push_str(&format!("{}\n", rendered_records.trim_end()));
    }
    prompt.push_str(
        "Based on the query results, provide a clear and concise answer to the user's question.",
    );

    Ok(prompt)
}

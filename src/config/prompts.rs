//! Fixed prompts for each pipeline stage
//!
//! The wording is part of the SmartGPT technique, so it is not configurable.

/// Step-by-step prompt wrapping the user's question for the fan-out stage
pub fn initial(question: &str) -> String {
    format!(
        "Question. {}\nAnswer: Let's work this out in a step by step way to be sure we have the right answer:",
        question
    )
}

/// Researcher instruction asking for the flaws of each candidate
pub fn critique(count: usize) -> String {
    format!(
        "You are a researcher tasked with investigating the {} response options provided. \
        List the flaws and faulty logic of each answer option. \
        Let's work this out in a step by step way to be sure we have all the errors:",
        count
    )
}

/// Resolver instruction asking for the best candidate, improved
pub fn resolve(count: usize) -> String {
    format!(
        "The previous responses are from the researcher. You are a resolver tasked with \
        1) finding which of the {} answer options the researcher thought was best \
        2) improving that answer, and 3) Printing the improved answer in full. \
        Let's work this out in a step by step way to be sure we have the right answer: ",
        count
    )
}

/// Instruction stripping everything but the improved answer
pub fn extract(resolved: &str) -> String {
    format!(
        "Based on the following response, extract out only the improved response and nothing else. \
        DO NOT include typical responses and the answer should only have the improved response: \n\n{}",
        resolved
    )
}

/// Label candidate answers as `Answer Option N: ...`, each followed by a blank line
pub fn concat_output(responses: &[String]) -> String {
    responses
        .iter()
        .enumerate()
        .map(|(i, response)| format!("Answer Option {}: {}\n\n", i + 1, response))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_output() {
        let answers = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(
            concat_output(&answers),
            "Answer Option 1: a\n\nAnswer Option 2: b\n\nAnswer Option 3: c\n\n"
        );
        assert_eq!(concat_output(&[]), "");
    }

    #[test]
    fn test_prompts_mention_count() {
        assert!(critique(3).contains("investigating the 3 response options"));
        assert!(resolve(2).contains("which of the 2 answer options"));
    }

    #[test]
    fn test_initial_prompt() {
        let prompt = initial("What is 2+2?");
        assert!(prompt.starts_with("Question. What is 2+2?\nAnswer: "));
        assert!(prompt.ends_with("the right answer:"));
    }

    #[test]
    fn test_extract_embeds_response() {
        assert!(extract("Improved: 4").ends_with("improved response: \n\nImproved: 4"));
    }
}

// src/core/prompt.rs — Prompt construction for judge evaluations

use super::types::{Answer, Question};

/// Fixed instruction block appended to every judge prompt. The verdict
/// parser depends on this reply shape.
const RESPONSE_FORMAT: &str = "Respond with a JSON object of this exact shape:\n\
     {\"verdict\": \"pass\" | \"fail\" | \"inconclusive\", \"reasoning\": \"brief explanation\"}";

/// Build the full prompt for one (judge, question, answer) evaluation.
///
/// Pure function. Missing answer fields are omitted from the rendered text;
/// a fully blank answer renders as an explicit "no answer" marker so the
/// judge still has something to rule on.
pub fn render(judge_instructions: &str, question: &Question, answer: Option<&Answer>) -> String {
    let mut prompt = String::new();

    prompt.push_str(judge_instructions.trim());
    prompt.push_str("\n\n## Question\n");
    prompt.push_str(&question.text);
    prompt.push('\n');

    prompt.push_str("\n## Answer\n");
    let rendered_fields = answer.map(|a| render_answer(a, &mut prompt)).unwrap_or(0);
    if rendered_fields == 0 {
        prompt.push_str("(no answer provided)\n");
    }

    prompt.push('\n');
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

/// Append each present answer field with a label. Returns how many fields
/// were rendered.
fn render_answer(answer: &Answer, out: &mut String) -> usize {
    let mut fields = 0;
    let mut push = |label: &str, value: &str| {
        out.push_str(label);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    };

    match answer {
        Answer::SingleChoice { choice } => {
            if let Some(c) = choice {
                push("Selected choice", c);
                fields += 1;
            }
        }
        Answer::SingleChoiceWithReasoning { choice, reasoning } => {
            if let Some(c) = choice {
                push("Selected choice", c);
                fields += 1;
            }
            if let Some(r) = reasoning {
                push("Reasoning", r);
                fields += 1;
            }
        }
        Answer::MultipleChoice { choices } => {
            if !choices.is_empty() {
                push("Selected choices", &choices.join(", "));
                fields += 1;
            }
        }
        Answer::FreeForm { response } => {
            if let Some(r) = response {
                push("Response", r);
                fields += 1;
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::QuestionKind;

    fn question(text: &str) -> Question {
        Question {
            id: "qu1".into(),
            kind: QuestionKind::SingleChoiceWithReasoning,
            text: text.into(),
        }
    }

    #[test]
    fn test_render_full_answer() {
        let q = question("Is the sky blue?");
        let a = Answer::SingleChoiceWithReasoning {
            choice: Some("Yes".into()),
            reasoning: Some("Rayleigh scattering.".into()),
        };
        let p = render("You grade physics answers.", &q, Some(&a));

        assert!(p.starts_with("You grade physics answers."));
        assert!(p.contains("## Question\nIs the sky blue?"));
        assert!(p.contains("Selected choice: Yes"));
        assert!(p.contains("Reasoning: Rayleigh scattering."));
        assert!(p.contains("\"verdict\""));
    }

    #[test]
    fn test_render_omits_missing_fields() {
        let q = question("Pick one.");
        let a = Answer::SingleChoiceWithReasoning {
            choice: Some("A".into()),
            reasoning: None,
        };
        let p = render("Instructions.", &q, Some(&a));
        assert!(p.contains("Selected choice: A"));
        assert!(!p.contains("Reasoning:"));
    }

    #[test]
    fn test_render_no_answer() {
        let q = question("Anything?");
        let p = render("Instructions.", &q, None);
        assert!(p.contains("(no answer provided)"));
    }

    #[test]
    fn test_render_empty_answer_variant() {
        let q = question("Anything?");
        let a = Answer::FreeForm { response: None };
        let p = render("Instructions.", &q, Some(&a));
        assert!(p.contains("(no answer provided)"));
    }

    #[test]
    fn test_render_multiple_choice() {
        let q = question("Pick all that apply.");
        let a = Answer::MultipleChoice {
            choices: vec!["A".into(), "C".into()],
        };
        let p = render("Instructions.", &q, Some(&a));
        assert!(p.contains("Selected choices: A, C"));
    }
}

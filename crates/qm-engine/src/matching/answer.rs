use std::collections::HashSet;

use crate::model::{AnswerValue, QuestionType, SELECTION_DELIMITER};

/// 設問タイプで解釈済みの回答
#[derive(Debug, Clone, PartialEq)]
pub enum TypedAnswer<'a> {
    /// 順序尺度（agree_5 / support_3）
    Scale { value: f64, max: f64 },
    /// 単一選択・二択・未知タイプ
    Choice(&'a AnswerValue),
    /// 複数選択（区切り文字で分割済み）
    Selection(HashSet<&'a str>),
}

impl<'a> TypedAnswer<'a> {
    /// A scale question whose value is not numeric, or a multiple-select
    /// question answered with a bare number, degrades to `Choice`.
    pub fn interpret(value: &'a AnswerValue, kind: &QuestionType) -> Self {
        if let Some(max) = kind.scale_max() {
            return match value.as_number() {
                Some(number) => TypedAnswer::Scale { value: number, max },
                None => TypedAnswer::Choice(value),
            };
        }

        if kind.is_multiple_select() {
            if let Some(text) = value.as_text() {
                return TypedAnswer::Selection(split_selection(text).collect());
            }
        }

        TypedAnswer::Choice(value)
    }
}

/// `"a | b||c"` → `a`, `b`, `c`
pub fn split_selection(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(SELECTION_DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_questions_read_numbers_and_numeric_text() {
        let number = AnswerValue::from(4);
        let text = AnswerValue::from("2");

        assert_eq!(
            TypedAnswer::interpret(&number, &QuestionType::Agree5),
            TypedAnswer::Scale {
                value: 4.0,
                max: 5.0
            }
        );
        assert_eq!(
            TypedAnswer::interpret(&text, &QuestionType::Support3),
            TypedAnswer::Scale {
                value: 2.0,
                max: 3.0
            }
        );
    }

    #[test]
    fn non_numeric_scale_answer_degrades_to_choice() {
        let value = AnswerValue::from("Strongly agree");
        assert_eq!(
            TypedAnswer::interpret(&value, &QuestionType::Agree5),
            TypedAnswer::Choice(&value)
        );
    }

    #[test]
    fn multiple_choice_splits_on_pipe() {
        let value = AnswerValue::from(" Protecting rights | Equal access ||");
        let TypedAnswer::Selection(set) =
            TypedAnswer::interpret(&value, &QuestionType::MultipleChoice)
        else {
            panic!("expected a selection");
        };

        assert_eq!(set.len(), 2);
        assert!(set.contains("Protecting rights"));
        assert!(set.contains("Equal access"));
    }

    #[test]
    fn categorical_and_unknown_types_are_choices() {
        let value = AnswerValue::from("Collective goals");
        assert_eq!(
            TypedAnswer::interpret(&value, &QuestionType::BinaryChoice),
            TypedAnswer::Choice(&value)
        );
        assert_eq!(
            TypedAnswer::interpret(&value, &QuestionType::Unknown("ranked".into())),
            TypedAnswer::Choice(&value)
        );
    }

    #[test]
    fn split_selection_drops_empty_tokens() {
        let tokens: Vec<_> = split_selection("|a| b |  |").collect();
        assert_eq!(tokens, vec!["a", "b"]);
        assert_eq!(split_selection("").count(), 0);
    }
}

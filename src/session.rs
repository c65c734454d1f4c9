//! Intake session driver.
//!
//! Runs a [`ConversationPolicy`] to completion: relays questions through a
//! [`Prompter`], fills the intake record, calls the validator and finally
//! the persister.

use crate::agent::TextGenerator;
use crate::clock::Clock;
use crate::conversation::{
    AnswerKind, Conversation, ConversationPolicy, Event, Field, Persona, Question, Turn,
};
use crate::request::{IncompleteRecord, RequirementValue};
use crate::storage::{PersistOutcome, RequestStore};
use crate::validation::{ValidationResult, Validator};
use thiserror::Error;

/// Upper bound on turns before a session is abandoned
pub const MAX_TURNS: usize = 200;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("prompt failed: {0}")]
    Prompt(String),
    #[error("conversation ended before the request was saved")]
    Abandoned,
    #[error("conversation did not finish within {0} turns")]
    TooManyTurns(usize),
    #[error("cannot save yet: {0}")]
    Incomplete(#[from] IncompleteRecord),
}

/// Two-way channel to the requester.
pub trait Prompter {
    /// Ask `question` on behalf of `persona` and return the raw answer
    fn ask(&mut self, persona: Persona, question: &Question) -> Result<String, SessionError>;

    /// Show a message from `persona`
    fn say(&mut self, persona: Persona, message: &str);
}

/// One intake conversation, from greeting to saved file.
pub struct IntakeSession<'a, P, V, S> {
    policy: P,
    validator: &'a Validator<V>,
    store: &'a RequestStore<S>,
    generator: &'a dyn TextGenerator,
    conversation: Conversation,
}

impl<'a, P, V, S> IntakeSession<'a, P, V, S>
where
    P: ConversationPolicy,
    V: Clock,
    S: Clock,
{
    pub fn new(
        policy: P,
        validator: &'a Validator<V>,
        store: &'a RequestStore<S>,
        generator: &'a dyn TextGenerator,
    ) -> Self {
        Self {
            policy,
            validator,
            store,
            generator,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Drive the conversation until the policy finishes.
    pub async fn run(
        &mut self,
        prompter: &mut dyn Prompter,
    ) -> Result<PersistOutcome, SessionError> {
        let mut outcome = None;
        prompter.say(
            self.conversation.persona(),
            self.conversation.persona().introduction(),
        );

        for _ in 0..MAX_TURNS {
            match self.policy.next_turn(&self.conversation) {
                Turn::Ask(question) => self.ask(prompter, &question)?,
                Turn::Validate => self.validate(prompter),
                Turn::HandOff(to) => {
                    let from = self.conversation.persona();
                    tracing::info!(from = from.name(), to = to.name(), "handing off");
                    self.conversation.push(Event::HandedOff { from, to });
                    prompter.say(to, to.introduction());
                }
                Turn::Persist => {
                    let result = self.persist().await?;
                    self.conversation.push(Event::Persisted {
                        success: result.is_success(),
                    });
                    prompter.say(self.conversation.persona(), result.message());
                    outcome = Some(result);
                }
                Turn::Finish => return outcome.ok_or(SessionError::Abandoned),
            }
        }

        Err(SessionError::TooManyTurns(MAX_TURNS))
    }

    fn ask(
        &mut self,
        prompter: &mut dyn Prompter,
        question: &Question,
    ) -> Result<(), SessionError> {
        let persona = self.conversation.persona();
        let answer = prompter.ask(persona, question)?;
        let answer = answer.trim().to_string();

        let record = self.conversation.record_mut();
        match question.field {
            Field::Name => record.draft.name = Some(answer.clone()),
            Field::Role => record.draft.role = Some(answer.clone()),
            Field::Department => record.draft.department = Some(answer.clone()),
            Field::Timeline => record.draft.timeline = Some(answer.clone()),
            Field::RequestType => match answer.parse() {
                Ok(request_type) => record.request_type = Some(request_type),
                Err(e) => prompter.say(persona, &format!("Sorry, {}.", e)),
            },
            Field::Requirement(key, kind) => {
                let value = match kind {
                    AnswerKind::Text => RequirementValue::Text(answer.clone()),
                    AnswerKind::List => RequirementValue::list_from_answer(&answer),
                };
                // Blank answers mean "not applicable" and are left out of the record
                if !value.is_empty() {
                    record.requirements.insert(key.to_string(), value);
                }
            }
        }

        self.conversation.push(Event::Answered {
            persona,
            field: question.field,
            answer,
        });
        Ok(())
    }

    fn validate(&mut self, prompter: &mut dyn Prompter) {
        let persona = self.conversation.persona();
        let record = self.conversation.record_mut();
        let draft = std::mem::take(&mut record.draft);
        let result = self.validator.validate(
            draft.name.as_deref().unwrap_or_default(),
            draft.role.as_deref().unwrap_or_default(),
            draft.department.as_deref().unwrap_or_default(),
            draft.timeline.as_deref().unwrap_or_default(),
        );

        match result {
            ValidationResult::Valid(info) => {
                record.basic_info = Some(info);
                self.conversation.push(Event::Validated);
            }
            ValidationResult::Invalid(errors) => {
                // The draft is already cleared, so all four fields are asked again
                let message = format!(
                    "A few details need another look:\n  - {}",
                    errors.join("\n  - ")
                );
                prompter.say(persona, &message);
                self.conversation.push(Event::Rejected { persona, errors });
            }
        }
    }

    async fn persist(&self) -> Result<PersistOutcome, SessionError> {
        let request = self.conversation.record().clone().finalize()?;
        Ok(self.store.persist(self.generator, request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentError;
    use crate::clock::FixedClock;
    use crate::conversation::ScriptedPolicy;
    use crate::request::{RequestType, RequirementValue};
    use crate::validation::FieldRules;
    use async_trait::async_trait;
    use chrono::{Local, TimeZone};
    use std::collections::VecDeque;

    struct Canned;

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String, AgentError> {
            Ok("A dashboard request.".to_string())
        }
    }

    #[derive(Default)]
    struct Script {
        answers: VecDeque<&'static str>,
        said: Vec<String>,
    }

    impl Script {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                said: Vec::new(),
            }
        }
    }

    impl Prompter for Script {
        fn ask(&mut self, _persona: Persona, question: &Question) -> Result<String, SessionError> {
            self.answers
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| SessionError::Prompt(format!("no answer for {:?}", question.field)))
        }

        fn say(&mut self, _persona: Persona, message: &str) {
            self.said.push(message.to_string());
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Local.with_ymd_and_hms(2025, 7, 14, 9, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn dashboard_conversation_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::with_clock(FieldRules::default(), clock());
        let store = RequestStore::with_clock(dir.path(), clock());
        let mut session = IntakeSession::new(ScriptedPolicy, &validator, &store, &Canned);

        let mut script = Script::new(&[
            // first attempt fails validation on the name
            "M", "VP of Marketing", "Marketing", "Next two weeks",
            "Mike Chen", "VP of Marketing", "Marketing", "Next two weeks",
            "forecasting", "dashboard",
            "Update the exec dashboard",
            "Marketing Performance",
            "Tableau Server",
            "Add TikTok metrics, CAC by channel",
            "C-suite",
            "Social ROI chart",
            "Daily at 6 AM",
            "",
            "",
            "Email alerts",
        ]);

        let outcome = session.run(&mut script).await.unwrap();
        assert!(outcome.is_success());
        assert!(script.answers.is_empty());
        assert!(script
            .said
            .iter()
            .any(|line| line.contains("Name must be at least 2 characters long")));
        assert!(script.said.iter().any(|line| line.contains("unknown request type")));

        let stored = store.load(outcome.file_path().unwrap()).unwrap();
        assert_eq!(stored.basic_info.name, "Mike Chen");
        assert_eq!(stored.request_type, RequestType::Dashboard);
        assert_eq!(
            stored.requirements.get("changes_needed"),
            Some(&RequirementValue::from(vec!["Add TikTok metrics", "CAC by channel"]))
        );
        assert!(!stored.requirements.contains_key("key_metrics"));
        assert!(!stored.requirements.contains_key("interactivity"));

        let rejections = session
            .conversation()
            .history()
            .iter()
            .filter(|event| matches!(event, Event::Rejected { .. }))
            .count();
        assert_eq!(rejections, 1);
    }

    #[tokio::test]
    async fn running_out_of_answers_stops_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::with_clock(FieldRules::default(), clock());
        let store = RequestStore::with_clock(dir.path(), clock());
        let mut session = IntakeSession::new(ScriptedPolicy, &validator, &store, &Canned);

        let err = session.run(&mut Script::new(&["Ann"])).await.unwrap_err();
        assert!(matches!(err, SessionError::Prompt(_)));
        assert!(store.list_all().unwrap().is_empty());
    }

    struct Silent;

    impl ConversationPolicy for Silent {
        fn next_turn(&self, _conversation: &Conversation) -> Turn {
            Turn::Finish
        }
    }

    struct Chatty;

    impl ConversationPolicy for Chatty {
        fn next_turn(&self, _conversation: &Conversation) -> Turn {
            Turn::HandOff(Persona::Intake)
        }
    }

    #[tokio::test]
    async fn finishing_without_saving_is_abandoned() {
        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::default();
        let store = RequestStore::open(dir.path());
        let mut session = IntakeSession::new(Silent, &validator, &store, &Canned);

        let err = session.run(&mut Script::default()).await.unwrap_err();
        assert!(matches!(err, SessionError::Abandoned));
    }

    #[tokio::test]
    async fn endless_policies_are_cut_off() {
        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::default();
        let store = RequestStore::open(dir.path());
        let mut session = IntakeSession::new(Chatty, &validator, &store, &Canned);

        let err = session.run(&mut Script::default()).await.unwrap_err();
        assert!(matches!(err, SessionError::TooManyTurns(MAX_TURNS)));
    }
}

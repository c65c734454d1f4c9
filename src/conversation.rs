//! Conversation flow: personas, turns and the policy that sequences them.
//!
//! A [`ConversationPolicy`] looks at the conversation so far and decides the
//! next [`Turn`]. The session driver carries out that turn (asking, validating,
//! handing off or persisting) and records the result, so policies stay pure
//! functions of the history.

use crate::request::{IntakeRecord, RequestType};

/// A scripted role in the intake funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    Coordinator,
    Intake,
    Specialist(RequestType),
    Summary(RequestType),
}

impl Persona {
    /// Stable agent name used in logs and transcripts
    pub fn name(&self) -> &'static str {
        match self {
            Self::Coordinator => "analytics_intake_coordinator",
            Self::Intake => "intake_agent",
            Self::Specialist(RequestType::Reports) => "reports_agent",
            Self::Specialist(RequestType::Dashboard) => "dashboard_agent",
            Self::Specialist(RequestType::Updates) => "updates_agent",
            Self::Summary(RequestType::Reports) => "reports_summary_agent",
            Self::Summary(RequestType::Dashboard) => "dashboard_summary_agent",
            Self::Summary(RequestType::Updates) => "updates_summary_agent",
        }
    }

    /// What the persona says when it takes over the conversation
    pub fn introduction(&self) -> &'static str {
        match self {
            Self::Coordinator => {
                "Welcome to the analytics request intake. I'll guide you through a short, \
                 structured set of questions so the analytics team gets everything it needs \
                 to pick up your request quickly."
            }
            Self::Intake => {
                "Let's start with a few details about you and when you need this completed."
            }
            Self::Specialist(RequestType::Reports) => {
                "I handle one-off reports. A few questions about what the report should cover."
            }
            Self::Specialist(RequestType::Dashboard) => {
                "I handle dashboards. Tell me about the dashboard you need, new or existing."
            }
            Self::Specialist(RequestType::Updates) => {
                "I handle updates to existing reports and analyses. Be specific about what \
                 should change and what should stay the same."
            }
            Self::Summary(_) => "Thanks, that's everything. Saving your request now.",
        }
    }

    /// Requirement questions asked by a specialist, in order
    pub fn questions(&self) -> &'static [Question] {
        match self {
            Self::Specialist(RequestType::Reports) => REPORT_QUESTIONS,
            Self::Specialist(RequestType::Dashboard) => DASHBOARD_QUESTIONS,
            Self::Specialist(RequestType::Updates) => UPDATE_QUESTIONS,
            Self::Coordinator | Self::Intake | Self::Summary(_) => &[],
        }
    }
}

/// Whether an answer is kept as text or split into a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Text,
    List,
}

/// Which slot of the intake record an answer fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Role,
    Department,
    Timeline,
    RequestType,
    Requirement(&'static str, AnswerKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub field: Field,
    pub prompt: &'static str,
}

impl Question {
    const fn text(key: &'static str, prompt: &'static str) -> Self {
        Self {
            field: Field::Requirement(key, AnswerKind::Text),
            prompt,
        }
    }

    const fn list(key: &'static str, prompt: &'static str) -> Self {
        Self {
            field: Field::Requirement(key, AnswerKind::List),
            prompt,
        }
    }
}

pub const BASIC_QUESTIONS: &[Question] = &[
    Question {
        field: Field::Name,
        prompt: "What is your full name?",
    },
    Question {
        field: Field::Role,
        prompt: "What is your role or title?",
    },
    Question {
        field: Field::Department,
        prompt: "Which department or team are you in?",
    },
    Question {
        field: Field::Timeline,
        prompt: "When do you need this completed?",
    },
];

pub const REQUEST_TYPE_QUESTION: Question = Question {
    field: Field::RequestType,
    prompt: "What kind of analytics help do you need? (reports, dashboard or updates)",
};

const REPORT_QUESTIONS: &[Question] = &[
    Question::text("purpose", "What is the purpose or objective of the report?"),
    Question::list(
        "metrics",
        "Which key metrics do you need? (comma separated, e.g. revenue, conversion rate)",
    ),
    Question::list(
        "data_sources",
        "Which data sources should it draw on? (CRM, web analytics, sales database...)",
    ),
    Question::text("time_period", "What time period should the data cover?"),
    Question::text(
        "filters",
        "Any filters or segments? (region, product, team...)",
    ),
    Question::text(
        "output_format",
        "What output format do you want? (Excel, PDF, email...)",
    ),
    Question::text("audience", "Who will receive or use the report?"),
];

const DASHBOARD_QUESTIONS: &[Question] = &[
    Question::text(
        "purpose",
        "What is the dashboard for, and is it a new dashboard or an update to an existing one?",
    ),
    Question::text(
        "dashboard_name",
        "If it already exists, what is the dashboard called? (leave blank for a new one)",
    ),
    Question::text(
        "dashboard_location",
        "Where does it live today? (leave blank for a new one)",
    ),
    Question::list("changes_needed", "Which specific changes are needed? (comma separated)"),
    Question::text(
        "target_audience",
        "Who is the target audience? (executives, sales team, operations...)",
    ),
    Question::list(
        "new_visualizations",
        "Which visualizations do you need? (charts, tables, KPIs; comma separated)",
    ),
    Question::text(
        "refresh_frequency",
        "How often should the data refresh? (real-time, daily, weekly, monthly)",
    ),
    Question::list(
        "key_metrics",
        "Which metrics and dimensions should it display? (comma separated)",
    ),
    Question::text(
        "interactivity",
        "Any interactivity requirements? (filters, drill-downs...)",
    ),
    Question::text(
        "integration_needs",
        "Any integration needs? (email alerts, embedding...)",
    ),
];

const UPDATE_QUESTIONS: &[Question] = &[
    Question::text(
        "existing_report_name",
        "What is the name of the existing report or analysis?",
    ),
    Question::text("current_location", "Where is it located or how is it accessed today?"),
    Question::list(
        "changes_needed",
        "Which specific changes are needed? (comma separated)",
    ),
    Question::text(
        "reason_for_update",
        "What is the reason for the update? (new business requirements, data issues...)",
    ),
    Question::list(
        "new_data_sources",
        "Any new data sources? (comma separated, leave blank if none)",
    ),
    Question::text(
        "timeline_changes",
        "Any changes to its schedule or timing? (leave blank if none)",
    ),
    Question::text(
        "distribution_changes",
        "Any format or distribution changes? (leave blank if none)",
    ),
    Question::list(
        "notify",
        "Who should be notified of the update? (comma separated)",
    ),
];

/// The next step the driver should carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Ask(Question),
    /// Run the validator over the drafted basic fields
    Validate,
    HandOff(Persona),
    /// Summarize and save the finished record
    Persist,
    Finish,
}

/// Something that happened in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Answered {
        persona: Persona,
        field: Field,
        answer: String,
    },
    Rejected {
        persona: Persona,
        errors: Vec<String>,
    },
    Validated,
    HandedOff {
        from: Persona,
        to: Persona,
    },
    Persisted {
        success: bool,
    },
}

/// Conversation history plus the intake record it has built so far.
#[derive(Debug, Clone)]
pub struct Conversation {
    persona: Persona,
    history: Vec<Event>,
    record: IntakeRecord,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            persona: Persona::Coordinator,
            history: Vec::new(),
            record: IntakeRecord::default(),
        }
    }

    /// The persona currently holding the conversation
    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn history(&self) -> &[Event] {
        &self.history
    }

    pub fn record(&self) -> &IntakeRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut IntakeRecord {
        &mut self.record
    }

    pub fn push(&mut self, event: Event) {
        if let Event::HandedOff { to, .. } = event {
            self.persona = to;
        }
        self.history.push(event);
    }

    /// Whether `persona` has already been asked the question for `field`
    pub fn was_asked(&self, persona: Persona, field: Field) -> bool {
        self.history.iter().any(|event| {
            matches!(
                event,
                Event::Answered { persona: p, field: f, .. } if *p == persona && *f == field
            )
        })
    }

    pub fn is_persisted(&self) -> bool {
        self.history
            .iter()
            .any(|event| matches!(event, Event::Persisted { .. }))
    }
}

/// Decides the next turn from the conversation so far.
pub trait ConversationPolicy {
    fn next_turn(&self, conversation: &Conversation) -> Turn;
}

/// Deterministic policy walking the fixed question script of each persona.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedPolicy;

impl ScriptedPolicy {
    fn intake_turn(conversation: &Conversation) -> Turn {
        let record = conversation.record();

        if record.basic_info.is_none() {
            let draft = &record.draft;
            let missing = [
                draft.name.is_none(),
                draft.role.is_none(),
                draft.department.is_none(),
                draft.timeline.is_none(),
            ];
            return match missing.iter().position(|missing| *missing) {
                Some(index) => Turn::Ask(BASIC_QUESTIONS[index]),
                None => Turn::Validate,
            };
        }

        match record.request_type {
            None => Turn::Ask(REQUEST_TYPE_QUESTION),
            Some(request_type) => Turn::HandOff(Persona::Specialist(request_type)),
        }
    }

    fn specialist_turn(conversation: &Conversation, request_type: RequestType) -> Turn {
        let persona = Persona::Specialist(request_type);
        persona
            .questions()
            .iter()
            .find(|question| !conversation.was_asked(persona, question.field))
            .map(|question| Turn::Ask(*question))
            .unwrap_or(Turn::HandOff(Persona::Summary(request_type)))
    }
}

impl ConversationPolicy for ScriptedPolicy {
    fn next_turn(&self, conversation: &Conversation) -> Turn {
        match conversation.persona() {
            Persona::Coordinator => Turn::HandOff(Persona::Intake),
            Persona::Intake => Self::intake_turn(conversation),
            Persona::Specialist(request_type) => Self::specialist_turn(conversation, request_type),
            Persona::Summary(_) if conversation.is_persisted() => Turn::Finish,
            Persona::Summary(_) => Turn::Persist,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::BasicInfo;
    use chrono::Local;

    fn hand_off(conversation: &mut Conversation, to: Persona) {
        let from = conversation.persona();
        conversation.push(Event::HandedOff { from, to });
    }

    #[test]
    fn coordinator_hands_off_to_intake() {
        let conversation = Conversation::new();
        assert_eq!(
            ScriptedPolicy.next_turn(&conversation),
            Turn::HandOff(Persona::Intake)
        );
    }

    #[test]
    fn intake_asks_basic_fields_in_order_then_validates() {
        let mut conversation = Conversation::new();
        hand_off(&mut conversation, Persona::Intake);
        assert_eq!(
            ScriptedPolicy.next_turn(&conversation),
            Turn::Ask(BASIC_QUESTIONS[0])
        );

        let draft = &mut conversation.record_mut().draft;
        draft.name = Some("Ann".into());
        draft.role = Some("Analyst".into());
        assert_eq!(
            ScriptedPolicy.next_turn(&conversation),
            Turn::Ask(BASIC_QUESTIONS[2])
        );

        let draft = &mut conversation.record_mut().draft;
        draft.department = Some("Finance".into());
        draft.timeline = Some("next week".into());
        assert_eq!(ScriptedPolicy.next_turn(&conversation), Turn::Validate);
    }

    #[test]
    fn validated_intake_asks_type_then_hands_to_specialist() {
        let mut conversation = Conversation::new();
        hand_off(&mut conversation, Persona::Intake);
        conversation.record_mut().basic_info = Some(BasicInfo {
            name: "Ann".into(),
            role: "Analyst".into(),
            department: "Finance".into(),
            timeline: "next week".into(),
            collected_at: Local::now(),
        });
        assert_eq!(
            ScriptedPolicy.next_turn(&conversation),
            Turn::Ask(REQUEST_TYPE_QUESTION)
        );

        conversation.record_mut().request_type = Some(RequestType::Updates);
        assert_eq!(
            ScriptedPolicy.next_turn(&conversation),
            Turn::HandOff(Persona::Specialist(RequestType::Updates))
        );
    }

    #[test]
    fn specialist_asks_each_question_once_then_hands_to_summary() {
        let persona = Persona::Specialist(RequestType::Reports);
        let mut conversation = Conversation::new();
        hand_off(&mut conversation, persona);

        for question in persona.questions() {
            assert_eq!(ScriptedPolicy.next_turn(&conversation), Turn::Ask(*question));
            conversation.push(Event::Answered {
                persona,
                field: question.field,
                answer: String::new(),
            });
        }
        assert_eq!(
            ScriptedPolicy.next_turn(&conversation),
            Turn::HandOff(Persona::Summary(RequestType::Reports))
        );
    }

    #[test]
    fn summary_persists_once_then_finishes() {
        let mut conversation = Conversation::new();
        hand_off(&mut conversation, Persona::Summary(RequestType::Dashboard));
        assert_eq!(ScriptedPolicy.next_turn(&conversation), Turn::Persist);

        conversation.push(Event::Persisted { success: true });
        assert_eq!(ScriptedPolicy.next_turn(&conversation), Turn::Finish);
    }

    #[test]
    fn every_specialist_has_a_script_and_distinct_names() {
        for request_type in RequestType::ALL {
            let specialist = Persona::Specialist(request_type);
            assert!(!specialist.questions().is_empty());
            assert!(specialist.name().starts_with(request_type.as_str()));
            assert_ne!(specialist.name(), Persona::Summary(request_type).name());
        }
    }
}

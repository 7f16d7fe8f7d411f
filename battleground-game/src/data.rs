use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::requirement::{Requirement, RequirementCheck, check_requirement};
use crate::stats::{StatDelta, Stats};

/// Stat deltas applied when a choice is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Effect {
    #[serde(default)]
    pub gpa: i32,
    #[serde(default)]
    pub money: i32,
    #[serde(default)]
    pub stress: i32,
    #[serde(default)]
    pub social: i32,
}

impl Effect {
    /// Apply the deltas to `stats`, returning a new clamped vector.
    #[must_use]
    pub fn apply(&self, stats: &Stats) -> Stats {
        Stats {
            gpa: stats.gpa.saturating_add(self.gpa),
            money: stats.money.saturating_add(self.money),
            stress: stats.stress.saturating_add(self.stress),
            social: stats.social.saturating_add(self.social),
        }
        .clamped()
    }

    #[must_use]
    pub const fn as_delta(&self) -> StatDelta {
        StatDelta {
            gpa: self.gpa,
            money: self.money,
            stress: self.stress,
            social: self.social,
        }
    }

    /// Human summary such as `GPA +10, STRESS +5`.
    #[must_use]
    pub fn describe(&self) -> String {
        self.as_delta().to_string()
    }
}

/// Card theme; events additionally use `Academic`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Study,
    Life,
    Money,
    Chaos,
    Academic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[default]
    Normal,
    Important,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// Whether a choice came from a month's cards or its bonus events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceKind {
    Card,
    Event,
}

impl fmt::Display for ChoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card => f.write_str("Card"),
            Self::Event => f.write_str("Event"),
        }
    }
}

/// A playable card or event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub category: Category,
    #[serde(default)]
    pub effect: Effect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Requirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_reason: Option<String>,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_semester: Option<u32>,
}

impl Choice {
    /// Minimal choice with no requirement or branching.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        effect: Effect,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            desc: String::new(),
            category,
            effect,
            requires: None,
            lock_reason: None,
            importance: Importance::Normal,
            rarity: Rarity::Common,
            hint: None,
            next_month: None,
            next_semester: None,
        }
    }

    #[must_use]
    pub fn with_requirement(mut self, requires: Requirement) -> Self {
        self.requires = Some(requires);
        self
    }

    #[must_use]
    pub fn with_lock_reason(mut self, reason: impl Into<String>) -> Self {
        self.lock_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub const fn with_next_month(mut self, month: u32) -> Self {
        self.next_month = Some(month);
        self
    }

    #[must_use]
    pub const fn with_next_semester(mut self, semester: u32) -> Self {
        self.next_semester = Some(semester);
        self
    }

    #[must_use]
    pub fn check(&self, stats: &Stats) -> RequirementCheck {
        check_requirement(self.requires.as_ref(), self.lock_reason.as_deref(), stats)
    }
}

/// One month of a semester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Month {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub cards: Vec<Choice>,
    #[serde(default)]
    pub events: Vec<Choice>,
}

impl Month {
    /// Cards then events, tagged with their kind.
    pub fn choices(&self) -> impl Iterator<Item = (ChoiceKind, &Choice)> {
        self.cards
            .iter()
            .map(|choice| (ChoiceKind::Card, choice))
            .chain(self.events.iter().map(|choice| (ChoiceKind::Event, choice)))
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<(ChoiceKind, &Choice)> {
        self.choices().find(|(_, choice)| choice.id == id)
    }
}

/// Exam-period content attached to a semester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamChapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub cards: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Semester {
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub months: Vec<Month>,
    #[serde(default = "default_exam_period")]
    pub exam_period: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_chapter: Option<ExamChapter>,
}

const fn default_exam_period() -> bool {
    true
}

impl Semester {
    #[must_use]
    pub fn month(&self, number: u32) -> Option<&Month> {
        self.months.iter().find(|month| month.number == number)
    }

    #[must_use]
    pub fn month_count(&self) -> u32 {
        u32::try_from(self.months.len()).unwrap_or(u32::MAX)
    }
}

/// Content authoring defects caught when a catalog is loaded
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog defines no semesters")]
    Empty,
    #[error("choice id `{id}` is defined more than once")]
    DuplicateChoiceId { id: String },
    #[error("choice `{id}` sets both next_month and next_semester")]
    ConflictingBranch { id: String },
    #[error("expected semester {expected}, found {found}")]
    SemesterOutOfOrder { expected: u32, found: u32 },
    #[error("semester {semester}: expected month {expected}, found {found}")]
    MonthOutOfOrder {
        semester: u32,
        expected: u32,
        found: u32,
    },
    #[error("semester {semester} has no months")]
    EmptySemester { semester: u32 },
    #[error("choice `{id}` branches to out-of-range target {target}")]
    BranchOutOfRange { id: String, target: u32 },
}

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("catalog JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog failed validation: {0}")]
    Invalid(#[from] CatalogError),
}

/// The authored tree of semesters, months, and choices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Catalog {
    pub semesters: Vec<Semester>,
}

impl Catalog {
    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            semesters: Vec::new(),
        }
    }

    /// Build and validate a catalog from pre-built semesters.
    ///
    /// # Errors
    ///
    /// Returns the first content defect found by [`Catalog::validate`].
    pub fn from_semesters(semesters: Vec<Semester>) -> Result<Self, CatalogError> {
        let catalog = Self { semesters };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the content violates
    /// a catalog invariant.
    pub fn from_json(json: &str) -> Result<Self, CatalogLoadError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check ordering, identity uniqueness, and branch targets.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] encountered in catalog order.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.semesters.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for (expected, semester) in (1_u32..).zip(&self.semesters) {
            if semester.number != expected {
                return Err(CatalogError::SemesterOutOfOrder {
                    expected,
                    found: semester.number,
                });
            }
            if semester.months.is_empty() {
                return Err(CatalogError::EmptySemester {
                    semester: semester.number,
                });
            }
            for (expected_month, month) in (1_u32..).zip(&semester.months) {
                if month.number != expected_month {
                    return Err(CatalogError::MonthOutOfOrder {
                        semester: semester.number,
                        expected: expected_month,
                        found: month.number,
                    });
                }
                for (_, choice) in month.choices() {
                    validate_choice(choice, semester.month_count(), &mut seen)?;
                }
            }
            if let Some(chapter) = &semester.exam_chapter {
                for choice in &chapter.cards {
                    validate_choice(choice, semester.month_count(), &mut seen)?;
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn semester(&self, number: u32) -> Option<&Semester> {
        self.semesters.iter().find(|semester| semester.number == number)
    }

    #[must_use]
    pub fn month(&self, semester: u32, month: u32) -> Option<&Month> {
        self.semester(semester).and_then(|s| s.month(month))
    }

    #[must_use]
    pub fn exam_chapter(&self, semester: u32) -> Option<&ExamChapter> {
        self.semester(semester)
            .and_then(|s| s.exam_chapter.as_ref())
    }

    /// Highest semester number defined, or 0 for an empty catalog.
    #[must_use]
    pub fn last_semester(&self) -> u32 {
        self.semesters
            .iter()
            .map(|semester| semester.number)
            .max()
            .unwrap_or(0)
    }

    /// Locate a choice anywhere in the catalog.
    #[must_use]
    pub fn find_choice(&self, id: &str) -> Option<(u32, u32, ChoiceKind, &Choice)> {
        self.semesters.iter().find_map(|semester| {
            semester.months.iter().find_map(|month| {
                month
                    .find(id)
                    .map(|(kind, choice)| (semester.number, month.number, kind, choice))
            })
        })
    }

    fn all_events(&self) -> impl Iterator<Item = &Choice> {
        self.semesters
            .iter()
            .flat_map(|semester| semester.months.iter())
            .flat_map(|month| month.events.iter())
    }

    #[must_use]
    pub fn events_by_category(&self, category: Category) -> Vec<&Choice> {
        self.all_events()
            .filter(|event| event.category == category)
            .collect()
    }

    #[must_use]
    pub fn events_by_rarity(&self, rarity: Rarity) -> Vec<&Choice> {
        self.all_events()
            .filter(|event| event.rarity == rarity)
            .collect()
    }

    /// Total number of choices across months (exam chapters excluded).
    #[must_use]
    pub fn choice_count(&self) -> usize {
        self.semesters
            .iter()
            .flat_map(|semester| semester.months.iter())
            .map(|month| month.cards.len() + month.events.len())
            .sum()
    }
}

fn validate_choice<'a>(
    choice: &'a Choice,
    month_count: u32,
    seen: &mut HashSet<&'a str>,
) -> Result<(), CatalogError> {
    if !seen.insert(choice.id.as_str()) {
        return Err(CatalogError::DuplicateChoiceId {
            id: choice.id.clone(),
        });
    }
    if choice.next_month.is_some() && choice.next_semester.is_some() {
        return Err(CatalogError::ConflictingBranch {
            id: choice.id.clone(),
        });
    }
    if let Some(target) = choice.next_month
        && (target == 0 || target > month_count)
    {
        return Err(CatalogError::BranchOutOfRange {
            id: choice.id.clone(),
            target,
        });
    }
    if choice.next_semester == Some(0) {
        return Err(CatalogError::BranchOutOfRange {
            id: choice.id.clone(),
            target: 0,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatField;

    fn month(number: u32, cards: Vec<Choice>) -> Month {
        Month {
            number,
            name: format!("Month {number}"),
            desc: String::new(),
            cards,
            events: Vec::new(),
        }
    }

    fn semester(number: u32, months: Vec<Month>) -> Semester {
        Semester {
            number,
            title: format!("Semester {number}"),
            desc: String::new(),
            months,
            exam_period: true,
            exam_chapter: None,
        }
    }

    fn card(id: &str) -> Choice {
        Choice::new(id, id, Category::Study, Effect::default())
    }

    #[test]
    fn effect_apply_clamps_without_mutating_input() {
        let stats = Stats::new(2, 95, 50, 50);
        let effect = Effect {
            gpa: -5,
            money: 20,
            ..Effect::default()
        };
        let next = effect.apply(&stats);
        assert_eq!(next, Stats::new(0, 100, 50, 50));
        assert_eq!(stats.gpa, 2);
        assert_eq!(effect.describe(), "GPA -5, MONEY +20");
    }

    #[test]
    fn catalog_from_json_reads_cards_and_events() {
        let json = r#"{
            "semesters": [{
                "number": 1,
                "title": "Freshman Fall",
                "months": [{
                    "number": 1,
                    "name": "Orientation",
                    "cards": [{
                        "id": "c1",
                        "name": "Attend Orientation",
                        "desc": "Meet people",
                        "category": "study",
                        "effect": { "gpa": 5, "social": 10, "stress": -5 }
                    }],
                    "events": [{
                        "id": "e1",
                        "name": "Exchange Program",
                        "desc": "Fly abroad",
                        "category": "life",
                        "rarity": "legendary",
                        "importance": "critical",
                        "requires": { "threshold": { "gpa": 70, "social": 30 } },
                        "lock_reason": "Need grades and friends",
                        "next_semester": 3
                    }]
                }]
            }]
        }"#;

        let catalog = Catalog::from_json(json).unwrap();
        let month = catalog.month(1, 1).unwrap();
        assert_eq!(month.cards[0].effect.social, 10);
        assert!(catalog.semester(1).unwrap().exam_period);
        let (kind, event) = month.find("e1").unwrap();
        assert_eq!(kind, ChoiceKind::Event);
        assert_eq!(event.rarity, Rarity::Legendary);
        assert_eq!(
            event.requires,
            Some(Requirement::threshold([
                (StatField::Gpa, 70),
                (StatField::Social, 30)
            ]))
        );
        assert_eq!(catalog.events_by_rarity(Rarity::Legendary).len(), 1);
        assert_eq!(catalog.events_by_category(Category::Life).len(), 1);
        assert_eq!(
            catalog.find_choice("c1").map(|(s, m, k, _)| (s, m, k)),
            Some((1, 1, ChoiceKind::Card))
        );
    }

    #[test]
    fn choice_description_is_optional() {
        let choice: Choice = serde_json::from_str(
            r#"{ "id": "nap", "name": "Nap", "category": "life", "effect": { "stress": -5 } }"#,
        )
        .unwrap();
        assert!(choice.desc.is_empty());
        assert_eq!(choice.effect.stress, -5);
    }

    #[test]
    fn duplicate_ids_are_rejected_across_months() {
        let result = Catalog::from_semesters(vec![semester(
            1,
            vec![month(1, vec![card("dup")]), month(2, vec![card("dup")])],
        )]);
        assert_eq!(
            result,
            Err(CatalogError::DuplicateChoiceId {
                id: "dup".to_string()
            })
        );
    }

    #[test]
    fn conflicting_branches_are_rejected() {
        let both = card("both").with_next_month(1).with_next_semester(2);
        let result = Catalog::from_semesters(vec![semester(1, vec![month(1, vec![both])])]);
        assert!(matches!(result, Err(CatalogError::ConflictingBranch { .. })));
    }

    #[test]
    fn ordering_and_shape_defects_are_reported() {
        assert_eq!(Catalog::empty().validate(), Err(CatalogError::Empty));
        assert_eq!(
            Catalog::from_semesters(vec![semester(2, vec![month(1, vec![])])]),
            Err(CatalogError::SemesterOutOfOrder {
                expected: 1,
                found: 2
            })
        );
        assert_eq!(
            Catalog::from_semesters(vec![semester(1, vec![month(2, vec![])])]),
            Err(CatalogError::MonthOutOfOrder {
                semester: 1,
                expected: 1,
                found: 2
            })
        );
        assert_eq!(
            Catalog::from_semesters(vec![semester(1, vec![])]),
            Err(CatalogError::EmptySemester { semester: 1 })
        );
    }

    #[test]
    fn month_branch_must_stay_inside_semester() {
        let jump = card("jump").with_next_month(4);
        let result = Catalog::from_semesters(vec![semester(
            1,
            vec![month(1, vec![jump]), month(2, vec![])],
        )]);
        assert_eq!(
            result,
            Err(CatalogError::BranchOutOfRange {
                id: "jump".to_string(),
                target: 4
            })
        );
    }

    #[test]
    fn malformed_json_surfaces_parse_error() {
        let err = Catalog::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CatalogLoadError::Parse(_)));
        assert!(err.to_string().starts_with("catalog JSON is malformed"));
    }
}

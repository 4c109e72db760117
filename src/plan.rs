use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("failed to read plan file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse plan file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("plan has no weeks")]
    Empty,
    #[error("invalid day key: {0}")]
    InvalidDayKey(String),
}

/// A (week, day) pair. Both parts are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayKey {
    pub week: u32,
    pub day: u32,
}

impl DayKey {
    pub fn new(week: u32, day: u32) -> Self {
        Self { week, day }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.week, self.day)
    }
}

impl FromStr for DayKey {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlanError::InvalidDayKey(s.to_string());
        let (week, day) = s.trim().split_once('-').ok_or_else(invalid)?;
        let week = week.parse::<u32>().map_err(|_| invalid())?;
        let day = day.parse::<u32>().map_err(|_| invalid())?;
        if week == 0 || day == 0 {
            return Err(invalid());
        }
        Ok(Self { week, day })
    }
}

/// Position of a single task: 1-based week and day, 0-based index within the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskCoord {
    pub week: u32,
    pub day: u32,
    pub index: usize,
}

impl TaskCoord {
    pub fn new(week: u32, day: u32, index: usize) -> Self {
        Self { week, day, index }
    }

    pub fn day_key(&self) -> DayKey {
        DayKey::new(self.week, self.day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    pub title: String,
    #[serde(default)]
    pub days: Vec<Day>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub title: String,
    pub weeks: Vec<Week>,
}

impl StudyPlan {
    pub fn from_json(raw: &str) -> Result<Self, PlanError> {
        let plan: StudyPlan = serde_json::from_str(raw)?;
        if plan.weeks.is_empty() {
            return Err(PlanError::Empty);
        }
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn week_count(&self) -> u32 {
        self.weeks.len() as u32
    }

    pub fn week(&self, week: u32) -> Option<&Week> {
        let idx = week.checked_sub(1)?;
        self.weeks.get(idx as usize)
    }

    pub fn day(&self, key: DayKey) -> Option<&Day> {
        let idx = key.day.checked_sub(1)?;
        self.week(key.week)?.days.get(idx as usize)
    }

    pub fn task_text(&self, coord: TaskCoord) -> Option<&str> {
        self.day(coord.day_key())?
            .tasks
            .get(coord.index)
            .map(String::as_str)
    }

    pub fn contains(&self, coord: TaskCoord) -> bool {
        self.task_text(coord).is_some()
    }

    pub fn task_count(&self) -> usize {
        self.weeks
            .iter()
            .flat_map(|week| week.days.iter())
            .map(|day| day.tasks.len())
            .sum()
    }

    pub fn week_task_count(&self, week: u32) -> usize {
        self.week(week)
            .map(|w| w.days.iter().map(|day| day.tasks.len()).sum())
            .unwrap_or(0)
    }

    /// Every task coordinate in document order.
    pub fn coords(&self) -> impl Iterator<Item = TaskCoord> + '_ {
        self.weeks.iter().enumerate().flat_map(|(w, week)| {
            week.days.iter().enumerate().flat_map(move |(d, day)| {
                (0..day.tasks.len()).map(move |i| TaskCoord::new(w as u32 + 1, d as u32 + 1, i))
            })
        })
    }

    /// Every (week, day) pair in document order.
    pub fn day_keys(&self) -> impl Iterator<Item = DayKey> + '_ {
        self.weeks.iter().enumerate().flat_map(|(w, week)| {
            (0..week.days.len()).map(move |d| DayKey::new(w as u32 + 1, d as u32 + 1))
        })
    }

    pub fn flat_index(&self, coord: TaskCoord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let mut offset = 0usize;
        for (w, week) in self.weeks.iter().enumerate() {
            for (d, day) in week.days.iter().enumerate() {
                if w as u32 + 1 == coord.week && d as u32 + 1 == coord.day {
                    return Some(offset + coord.index);
                }
                offset += day.tasks.len();
            }
        }
        None
    }

    pub fn coord_at(&self, flat: usize) -> Option<TaskCoord> {
        self.coords().nth(flat)
    }

    /// The four-week licensing exam plan served when no plan file is configured.
    pub fn default_plan() -> Self {
        let weeks = DEFAULT_PLAN
            .iter()
            .map(|(title, days)| Week {
                title: title.to_string(),
                days: days
                    .iter()
                    .map(|(day_title, tasks)| Day {
                        title: day_title.to_string(),
                        tasks: tasks.iter().map(|t| t.to_string()).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            title: "Malta Nursing Licensure Study Plan".to_string(),
            weeks,
        }
    }
}

type DayTemplate = (&'static str, &'static [&'static str]);

const DEFAULT_PLAN: &[(&str, &[DayTemplate])] = &[
    (
        "Foundations of Nursing Practice",
        &[
            (
                "Professional Standards in Malta",
                &[
                    "Read the NMC Malta code of professional conduct",
                    "Summarise scope of practice for registered nurses",
                    "Review accountability and delegation principles",
                ],
            ),
            (
                "Patient Safety Basics",
                &[
                    "Study infection prevention and hand hygiene",
                    "Review falls risk assessment tools",
                    "Complete a medication safety quiz",
                ],
            ),
            (
                "Communication Skills",
                &[
                    "Practise SBAR handover scenarios",
                    "Review therapeutic communication techniques",
                    "Write a reflective note on a difficult conversation",
                ],
            ),
            (
                "Legal and Ethical Framework",
                &[
                    "Study informed consent requirements",
                    "Review data protection for patient records",
                    "Read two ethics case studies",
                ],
            ),
            (
                "Week 1 Review",
                &[
                    "Take the foundations practice test",
                    "Revisit weak topics from the practice test",
                ],
            ),
        ],
    ),
    (
        "Clinical Skills and Assessment",
        &[
            (
                "Vital Signs",
                &[
                    "Review normal adult vital sign ranges",
                    "Study early warning scores",
                    "Practise documenting observations",
                ],
            ),
            (
                "Medication Administration",
                &[
                    "Drill drug calculation problems",
                    "Review routes of administration",
                    "Study high-alert medications",
                ],
            ),
            (
                "Wound Care",
                &[
                    "Learn pressure ulcer staging",
                    "Review aseptic technique steps",
                    "Compare common dressing types",
                ],
            ),
            (
                "Fluid and Electrolytes",
                &[
                    "Study fluid balance charting",
                    "Review signs of dehydration and overload",
                    "Memorise key electrolyte ranges",
                ],
            ),
            (
                "Week 2 Review",
                &[
                    "Take the clinical skills practice test",
                    "Make flashcards for missed questions",
                ],
            ),
        ],
    ),
    (
        "Medical-Surgical Nursing",
        &[
            (
                "Cardiovascular Care",
                &[
                    "Review heart failure management",
                    "Study ECG basics",
                    "Learn post-MI nursing priorities",
                ],
            ),
            (
                "Respiratory Care",
                &[
                    "Review COPD and asthma care plans",
                    "Study oxygen therapy devices",
                    "Practise interpreting blood gases",
                ],
            ),
            (
                "Diabetes and Endocrine",
                &[
                    "Review insulin types and timing",
                    "Study hypoglycaemia management",
                    "Read diabetic foot care guidance",
                ],
            ),
            (
                "Perioperative Care",
                &[
                    "Study pre-operative checklists",
                    "Review post-operative complications",
                    "Learn pain assessment scales",
                ],
            ),
            (
                "Week 3 Review",
                &[
                    "Take the medical-surgical practice test",
                    "Review rationales for every wrong answer",
                ],
            ),
        ],
    ),
    (
        "Exam Readiness",
        &[
            (
                "Mental Health Nursing",
                &[
                    "Review risk assessment for self-harm",
                    "Study common psychotropic medications",
                    "Read the Mental Health Act overview",
                ],
            ),
            (
                "Maternal and Child Health",
                &[
                    "Review paediatric vital sign ranges",
                    "Study immunisation schedule in Malta",
                    "Learn postnatal assessment basics",
                ],
            ),
            (
                "Older Adult Care",
                &[
                    "Study dementia care approaches",
                    "Review polypharmacy risks",
                    "Learn delirium screening",
                ],
            ),
            (
                "Full Mock Exam",
                &[
                    "Sit a timed full-length mock exam",
                    "Score the mock and list weak areas",
                ],
            ),
            (
                "Final Review",
                &[
                    "Revisit flashcards for weak areas",
                    "Prepare exam day logistics",
                    "Rest and light review only",
                ],
            ),
        ],
    ),
];

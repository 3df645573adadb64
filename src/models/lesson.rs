use serde::Serialize;

/// Micro-lesson catalog. Lessons are static content shipped with the
/// service; only per-user completion is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SkillLesson {
    pub id: &'static str,
    pub title: &'static str,
    pub content: &'static str,
    pub quiz: Quiz,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub question: &'static str,
    pub options: &'static [&'static str],
    /// Not serialized: the client must not see the answer key.
    #[serde(skip_serializing)]
    pub correct_index: i32,
    pub explanation: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LessonWithStatus {
    #[serde(flatten)]
    pub lesson: SkillLesson,
    pub completed: bool,
}

pub fn catalog() -> &'static [SkillLesson] {
    LESSONS
}

pub fn find(id: &str) -> Option<&'static SkillLesson> {
    LESSONS.iter().find(|l| l.id == id)
}

static LESSONS: &[SkillLesson] = &[
    SkillLesson {
        id: "healthy-boundaries",
        title: "Setting Healthy Boundaries",
        content: "Setting boundaries at work is essential for your wellbeing and \
            productivity. Three simple ways to establish healthy boundaries:\n\n\
            1. Be clear and direct about your capacity\n\
            2. Use \"I\" statements when communicating limits\n\
            3. Schedule focused work time on your calendar\n\n\
            Setting boundaries isn't selfish. It helps you deliver your best work \
            sustainably.",
        quiz: Quiz {
            question: "What's an effective way to communicate a boundary to a \
                colleague who frequently interrupts your work?",
            options: &[
                "Ignore their messages and hope they stop",
                "Say: 'I'd like to help, but I need to finish this task first. Can we talk at 2pm?'",
                "Complain to your manager about the interruptions",
                "Take on their request but work late to finish your own tasks",
            ],
            correct_index: 1,
            explanation: "Clear, respectful communication that acknowledges their \
                needs while protecting your time is the most effective approach to \
                setting boundaries.",
        },
    },
    SkillLesson {
        id: "effective-email",
        title: "Effective Email Communication",
        content: "Email overwhelm is a common workplace stressor. These strategies \
            can help you communicate more effectively:\n\n\
            1. Use clear, specific subject lines\n\
            2. Start with your main point or request\n\
            3. Format using bullets and short paragraphs\n\
            4. End with clear next steps or expectations\n\n\
            Mastering email communication can save you hours each week and reduce \
            miscommunication stress.",
        quiz: Quiz {
            question: "Which of these is the most effective email subject line?",
            options: &[
                "Hello",
                "Quick question",
                "Project update - decision needed by Friday",
                "URGENT!!!",
            ],
            correct_index: 2,
            explanation: "The best subject lines are specific, informative, and \
                include any relevant deadlines or actions needed.",
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<_> = catalog().iter().map(|l| l.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn correct_index_is_in_range() {
        for lesson in catalog() {
            let idx = lesson.quiz.correct_index;
            assert!(
                (0..lesson.quiz.options.len() as i32).contains(&idx),
                "lesson {} has out-of-range answer index",
                lesson.id
            );
        }
    }

    #[test]
    fn answer_key_is_not_serialized() {
        let json = serde_json::to_value(&catalog()[0]).unwrap();
        assert!(json["quiz"].get("correct_index").is_none());
        assert!(json["quiz"].get("question").is_some());
    }
}

use std::fmt;
use std::str::FromStr;

/// Kind of gated content; selects the copy shown on the locked card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateType {
    Quiz,
    Summary,
    Exercise,
    Premium,
}

/// Static copy and iconography for one gate type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDescriptor {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub benefit: &'static str,
}

const QUIZ: GateDescriptor = GateDescriptor {
    title: "Test Your Knowledge",
    description: "Sign in to access chapter quizzes and track your learning progress.",
    icon: "🎯",
    benefit: "Get instant feedback and see how you compare",
};

const SUMMARY: GateDescriptor = GateDescriptor {
    title: "Quick Reference",
    description: "Sign in to unlock lesson summaries for quick review and revision.",
    icon: "📋",
    benefit: "Save hours with condensed key takeaways",
};

const EXERCISE: GateDescriptor = GateDescriptor {
    title: "Hands-On Practice",
    description: "Sign in to access coding exercises with guided solutions.",
    icon: "💻",
    benefit: "Build real skills through practical application",
};

const PREMIUM: GateDescriptor = GateDescriptor {
    title: "Premium Content",
    description: "Sign in to unlock this exclusive learning material.",
    icon: "✨",
    benefit: "Get the complete learning experience",
};

impl GateType {
    pub const ALL: [GateType; 4] = [
        GateType::Quiz,
        GateType::Summary,
        GateType::Exercise,
        GateType::Premium,
    ];

    #[must_use]
    pub fn descriptor(self) -> &'static GateDescriptor {
        match self {
            GateType::Quiz => &QUIZ,
            GateType::Summary => &SUMMARY,
            GateType::Exercise => &EXERCISE,
            GateType::Premium => &PREMIUM,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GateType::Quiz => "quiz",
            GateType::Summary => "summary",
            GateType::Exercise => "exercise",
            GateType::Premium => "premium",
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GateType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown gate type '{s}' (expected quiz, summary, exercise or premium)")
            })
    }
}

// Keyword modifier enhancer: crosses base keywords with static modifier
// categories and annotates each variant with heuristic volume, competition
// and content type. Also builds import lists for keyword tools.

pub mod enhancer;
pub mod export;
pub mod handlers;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchIntent {
    Informational,
    Commercial,
    Transactional,
}

impl SearchIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchIntent::Informational => "informational",
            SearchIntent::Commercial => "commercial",
            SearchIntent::Transactional => "transactional",
        }
    }

    /// Content type used when no keyword substring matches.
    pub fn default_content_type(self) -> &'static str {
        match self {
            SearchIntent::Informational => "blog_post",
            SearchIntent::Commercial => "product_review",
            SearchIntent::Transactional => "product_page",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModifierCategory {
    pub key: &'static str,
    pub name: &'static str,
    pub intent: SearchIntent,
    pub use_case: &'static str,
    pub modifiers: &'static [&'static str],
}

/// Fixed order. Output ordering and CSV rows follow it.
pub const MODIFIER_CATEGORIES: &[ModifierCategory] = &[
    ModifierCategory {
        key: "security_tools",
        name: "Security Tools",
        intent: SearchIntent::Commercial,
        use_case: "Security system tools and interfaces",
        modifiers: &[
            "control-panel", "mobile-app", "web-interface", "dashboard",
            "monitoring-station", "alert-system", "sensor-network", "camera-setup",
        ],
    },
    ModifierCategory {
        key: "services",
        name: "Services",
        intent: SearchIntent::Commercial,
        use_case: "Service offerings and professional help",
        modifiers: &[
            "consultation", "coaching", "training", "course", "workshop",
            "service", "repair", "installation", "maintenance", "cleaning",
        ],
    },
    ModifierCategory {
        key: "information_learning",
        name: "Information & Learning",
        intent: SearchIntent::Informational,
        use_case: "Educational content and knowledge sharing",
        modifiers: &[
            "advice", "tips", "tutorial", "review", "comparison",
            "analysis", "strategy", "method", "technique", "solution",
        ],
    },
    ModifierCategory {
        key: "commercial_intent",
        name: "Commercial Intent",
        intent: SearchIntent::Commercial,
        use_case: "Product-focused and purchase-oriented content",
        modifiers: &[
            "kit", "supplies", "equipment", "accessories", "parts",
            "rental", "subscription", "membership", "package", "bundle",
        ],
    },
    ModifierCategory {
        key: "problem_solving",
        name: "Problem-Solving",
        intent: SearchIntent::Informational,
        use_case: "Solution-focused content addressing pain points",
        modifiers: &[
            "problem", "issue", "fix", "troubleshooting", "optimization",
            "improvement", "upgrade", "replacement", "alternative", "workaround",
        ],
    },
    ModifierCategory {
        key: "planning_organization",
        name: "Planning & Organization",
        intent: SearchIntent::Informational,
        use_case: "Strategic and organizational content",
        modifiers: &[
            "planning", "management", "organization", "scheduling",
            "budget", "cost", "pricing", "estimate", "forecast", "preparation",
        ],
    },
    ModifierCategory {
        key: "security_specific",
        name: "Security-Specific",
        intent: SearchIntent::Commercial,
        use_case: "Security and smart home technology content",
        modifiers: &[
            "surveillance", "monitoring", "alarm", "detection", "protection",
            "access", "control", "wireless", "smart", "automated", "AI",
            "night", "vision", "cloud", "mobile", "remote", "real-time",
            "encrypted", "secure", "24/7", "HD", "4K", "weatherproof", "battery",
        ],
    },
    ModifierCategory {
        key: "home_automation",
        name: "Home Automation",
        intent: SearchIntent::Commercial,
        use_case: "Smart home and automation technology content",
        modifiers: &[
            "smart", "automated", "voice", "app", "mobile", "wireless",
            "integrated", "connected", "IoT", "Alexa", "Google", "Siri",
            "schedule", "timer", "notification", "geofence", "IFTTT",
        ],
    },
    ModifierCategory {
        key: "installation_setup",
        name: "Installation & Setup",
        intent: SearchIntent::Informational,
        use_case: "Installation and configuration guidance",
        modifiers: &[
            "setup", "installation", "configuration", "mounting", "wiring",
            "DIY", "professional", "sync", "pairing", "calibration",
            "positioning", "placement", "adjustment", "fine-tuning",
        ],
    },
];

pub fn category_count() -> usize {
    MODIFIER_CATEGORIES.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_nine_categories_in_fixed_order() {
        let keys: Vec<&str> = MODIFIER_CATEGORIES.iter().map(|c| c.key).collect();
        assert_eq!(
            keys,
            [
                "security_tools",
                "services",
                "information_learning",
                "commercial_intent",
                "problem_solving",
                "planning_organization",
                "security_specific",
                "home_automation",
                "installation_setup",
            ]
        );
    }

    #[test]
    fn test_modifiers_unique_within_category() {
        for category in MODIFIER_CATEGORIES {
            let unique: HashSet<_> = category.modifiers.iter().collect();
            assert_eq!(unique.len(), category.modifiers.len(), "{}", category.key);
            assert!(category.modifiers.len() >= 8);
        }
    }
}

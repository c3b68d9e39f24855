//! Static demo feed with pre-authored analyses.

use std::collections::BTreeSet;
use std::fmt;

use chrono::Duration;
use once_cell::sync::Lazy;

use crate::analysis::CredibilityScore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    News,
    Ad,
    Meme,
    Misinformation,
    Opinion,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::News => "news",
            PostKind::Ad => "ad",
            PostKind::Meme => "meme",
            PostKind::Misinformation => "misinformation",
            PostKind::Opinion => "opinion",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PostInsights {
    pub content_type: &'static str,
    pub credibility_flags: Vec<&'static str>,
    pub algorithm_factors: Vec<&'static str>,
    pub emotional_tactics: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct DemoPost {
    pub id: &'static str,
    pub kind: PostKind,
    pub author: &'static str,
    pub content: &'static str,
    pub posted_ago: Duration,
    pub credibility_score: CredibilityScore,
    pub emotional_tone: &'static str,
    pub insights: PostInsights,
}

impl DemoPost {
    pub fn initial(&self) -> char {
        self.author.chars().next().unwrap_or('?')
    }

    pub fn posted_label(&self) -> String {
        relative_time(self.posted_ago)
    }
}

pub static DEMO_POSTS: Lazy<Vec<DemoPost>> = Lazy::new(|| {
    vec![
        DemoPost {
            id: "1",
            kind: PostKind::News,
            author: "TechNews Daily",
            content: "Breaking: New study from Stanford University shows that critical thinking skills can be improved through structured digital literacy training. Researchers found a 40% improvement in misinformation detection among participants.",
            posted_ago: Duration::hours(2),
            credibility_score: CredibilityScore::High,
            emotional_tone: "neutral",
            insights: PostInsights {
                content_type: "This is a news article from a verified source (TechNews Daily). It cites an academic study from a reputable institution.",
                credibility_flags: vec![
                    "Links to peer-reviewed research",
                    "Verified news source",
                    "Uses specific data and statistics",
                    "Neutral, factual language",
                ],
                algorithm_factors: vec![
                    "High engagement from educational circles",
                    "Shared by verified accounts",
                    "Trending in technology category",
                ],
                emotional_tactics: vec!["Minimal emotional manipulation", "Focuses on facts and research"],
            },
        },
        DemoPost {
            id: "2",
            kind: PostKind::Ad,
            author: "SuperVitamin Co.",
            content: "🔥 DOCTORS DON'T WANT YOU TO KNOW! This one miracle supplement will change your life! Limited time offer - 70% OFF! 🚨 Only 3 left in stock! Click now or miss out forever!",
            posted_ago: Duration::hours(1),
            credibility_score: CredibilityScore::Low,
            emotional_tone: "urgent",
            insights: PostInsights {
                content_type: "This is a sponsored advertisement for a health product, using aggressive marketing tactics.",
                credibility_flags: vec![
                    "Uses sensationalist language ('DOCTORS DON'T WANT YOU TO KNOW')",
                    "Creates false urgency ('Only 3 left!')",
                    "Makes unverifiable claims ('miracle supplement')",
                    "No scientific evidence provided",
                    "Excessive use of emojis and caps lock",
                ],
                algorithm_factors: vec![
                    "Paid promotion - boosted to reach more users",
                    "Targeted based on your browsing history",
                    "High click-through rate due to urgency tactics",
                ],
                emotional_tactics: vec![
                    "Fear of missing out (FOMO)",
                    "Appeal to authority ('DOCTORS')",
                    "Artificial scarcity",
                    "Sensationalism",
                ],
            },
        },
        DemoPost {
            id: "3",
            kind: PostKind::Meme,
            author: "MemeLord_2024",
            content: "When you finally understand how social media algorithms work: [imagine meme showing person having mind blown moment] 🤯 Tag someone who needs to see this!",
            posted_ago: Duration::minutes(30),
            credibility_score: CredibilityScore::Medium,
            emotional_tone: "humorous",
            insights: PostInsights {
                content_type: "This is a meme - content designed for entertainment and viral sharing. While harmless, it's optimized for engagement.",
                credibility_flags: vec![
                    "Entertainment content, not informational",
                    "Designed to be shared ('Tag someone')",
                    "No factual claims to verify",
                ],
                algorithm_factors: vec![
                    "High engagement rate (shares, likes, comments)",
                    "Uses trending format",
                    "Call-to-action increases interaction",
                    "Algorithm prioritizes engaging content",
                ],
                emotional_tactics: vec![
                    "Humor to lower critical thinking",
                    "Peer pressure ('Tag someone')",
                    "Relatability to encourage sharing",
                ],
            },
        },
        DemoPost {
            id: "4",
            kind: PostKind::Misinformation,
            author: "TruthSeeker1776",
            content: "WAKE UP PEOPLE! The government is using 5G towers to control your thoughts! My neighbor's cousin's friend works at a tech company and confirmed this. They're hiding it from mainstream media! Share before this gets deleted!!!",
            posted_ago: Duration::hours(4),
            credibility_score: CredibilityScore::Low,
            emotional_tone: "fear-based",
            insights: PostInsights {
                content_type: "This post contains unverified claims and conspiracy theory elements. Multiple red flags indicate misinformation.",
                credibility_flags: vec![
                    "Extraordinary claims without evidence",
                    "Appeals to 'hidden knowledge'",
                    "Uses third-hand sourcing ('cousin's friend')",
                    "Fear-mongering language",
                    "Urgency to share 'before deletion'",
                    "ALL CAPS to create alarm",
                ],
                algorithm_factors: vec![
                    "Controversial content generates high engagement",
                    "People commenting to debunk = more visibility",
                    "Algorithm can't always distinguish truth from fiction",
                ],
                emotional_tactics: vec![
                    "Fear and paranoia",
                    "Appeal to 'us vs. them' mentality",
                    "False urgency",
                    "Conspiracy thinking",
                ],
            },
        },
        DemoPost {
            id: "5",
            kind: PostKind::Opinion,
            author: "Sarah Martinez",
            content: "Unpopular opinion: I think we need better digital literacy education in schools. Kids are growing up online but nobody's teaching them how to verify information or understand algorithms. What do you all think?",
            posted_ago: Duration::hours(5),
            credibility_score: CredibilityScore::High,
            emotional_tone: "thoughtful",
            insights: PostInsights {
                content_type: "This is an opinion piece - a personal viewpoint that invites discussion. It's clearly labeled as opinion and encourages dialogue.",
                credibility_flags: vec![
                    "Clearly states it's an opinion",
                    "Asks for input from others",
                    "Reasonable, measured language",
                    "Focuses on education and improvement",
                ],
                algorithm_factors: vec![
                    "Question format increases comments",
                    "Educational content may be prioritized",
                    "Engagement from like-minded users",
                ],
                emotional_tactics: vec![
                    "Appeal to shared concerns",
                    "Open-ended question encourages participation",
                    "Moderate, non-aggressive tone",
                ],
            },
        },
    ]
});

pub fn find_post(id: &str) -> Option<&'static DemoPost> {
    DEMO_POSTS.iter().find(|post| post.id == id)
}

/// "30 minutes ago", "1 hour ago", "3 days ago".
pub fn relative_time(ago: Duration) -> String {
    fn plural(n: i64, unit: &str) -> String {
        if n == 1 {
            format!("1 {} ago", unit)
        } else {
            format!("{} {}s ago", n, unit)
        }
    }

    if ago.num_days() > 0 {
        plural(ago.num_days(), "day")
    } else if ago.num_hours() > 0 {
        plural(ago.num_hours(), "hour")
    } else if ago.num_minutes() > 0 {
        plural(ago.num_minutes(), "minute")
    } else {
        "just now".to_string()
    }
}

/// Which posts have their analysis panel revealed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedView {
    open: BTreeSet<&'static str>,
}

impl FeedView {
    /// Parses a comma-separated list of post ids; unknown ids are dropped.
    pub fn from_query(open: Option<&str>) -> Self {
        let mut view = FeedView::default();
        for id in open.unwrap_or_default().split(',').map(str::trim) {
            if let Some(post) = find_post(id) {
                view.open.insert(post.id);
            }
        }
        view
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open.contains(id)
    }

    pub fn toggle(&mut self, id: &str) {
        let Some(post) = find_post(id) else { return };
        if !self.open.remove(post.id) {
            self.open.insert(post.id);
        }
    }

    pub fn to_query(&self) -> String {
        self.open.iter().copied().collect::<Vec<_>>().join(",")
    }

    /// Link that flips `id` while keeping every other panel as is.
    pub fn toggle_href(&self, base: &str, id: &str) -> String {
        let mut next = self.clone();
        next.toggle(id);
        let query = next.to_query();
        if query.is_empty() {
            format!("{}#post-{}", base, id)
        } else {
            format!("{}?open={}#post-{}", base, query, id)
        }
    }
}

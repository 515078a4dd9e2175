//! Keyword-driven assistant. Rules are checked in order and the first match
//! wins; anything unrecognised falls through to a plain text search.

use crate::directory::Directory;
use crate::geo::{Coordinates, Unit};
use crate::models::{BusinessSummary, Profile, SearchQuery, SortKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

const NEARBY_RADIUS_MILES: f64 = 5.0;
const LIST_LIMIT: usize = 5;
const RECOMMEND_LIMIT: usize = 3;
const TOP_LIMIT: usize = 3;

const GREETINGS: &[&str] = &["hi", "hello", "hey", "howdy"];
const DEAL_WORDS: &[&str] = &["deal", "discount", "coupon", "sale", "offer"];
const RECOMMEND_WORDS: &[&str] = &["recommend", "recommendation", "suggest", "suggestion"];
const NEARBY_WORDS: &[&str] = &["near", "nearby", "close to me", "around me"];
const TOP_WORDS: &[&str] = &["best", "top", "highest rated"];
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "any", "you", "can", "find", "show", "what", "where", "with",
    "some", "want", "need", "looking", "place", "places", "good", "please", "there", "have",
];

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Help,
    Deals,
    Recommend,
    Nearby,
    Hours,
    TopRated,
    Category,
    Search,
    Fallback,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub intent: Intent,
    pub reply: String,
    pub businesses: Vec<BusinessSummary>,
}

impl ChatReply {
    fn text(intent: Intent, reply: impl Into<String>) -> Self {
        Self {
            intent,
            reply: reply.into(),
            businesses: Vec::new(),
        }
    }

    fn listing(intent: Intent, heading: &str, businesses: Vec<BusinessSummary>) -> Self {
        let mut reply = heading.to_string();
        for summary in &businesses {
            reply.push('\n');
            reply.push_str(&describe(summary));
        }
        Self {
            intent,
            reply,
            businesses,
        }
    }
}

const HELP_TEXT: &str = "I can help you find businesses. Try \"coffee\", \"deals\", \
\"best food\", \"what's nearby\", \"hours for Iron Gym\" or \"recommend something\".";

pub fn respond(directory: &Directory, profile: &Profile, request: &ChatRequest) -> ChatReply {
    let message = request.message.trim().to_lowercase();
    let words = tokenize(&message);
    debug!(message = %message, "chat message");

    if message.is_empty() {
        return ChatReply::text(Intent::Help, HELP_TEXT);
    }
    if words.iter().any(|word| GREETINGS.contains(&word.as_str())) && words.len() <= 3 {
        return ChatReply::text(Intent::Greeting, format!("Hello! {HELP_TEXT}"));
    }
    if words.iter().any(|word| word == "help") {
        return ChatReply::text(Intent::Help, HELP_TEXT);
    }
    if mentions_any(&message, &words, DEAL_WORDS) {
        return deals(directory);
    }
    if mentions_any(&message, &words, RECOMMEND_WORDS) {
        let picks = directory
            .recommend(profile, RECOMMEND_LIMIT)
            .into_iter()
            .map(|pick| pick.summary)
            .collect::<Vec<_>>();
        if picks.is_empty() {
            return ChatReply::text(Intent::Recommend, "I have nothing to recommend yet.");
        }
        return ChatReply::listing(Intent::Recommend, "You might like:", picks);
    }
    if mentions_any(&message, &words, NEARBY_WORDS) {
        return nearby(directory, request);
    }
    if message.contains("hours") || words.iter().any(|word| word == "open") {
        if let Some(reply) = hours(directory, &message) {
            return reply;
        }
    }

    let category = mentioned_category(directory, &words);
    if mentions_any(&message, &words, TOP_WORDS) {
        return top_rated(directory, category);
    }
    if let Some(category) = category {
        let query = SearchQuery {
            category: Some(category.clone()),
            limit: Some(LIST_LIMIT),
            ..SearchQuery::default()
        };
        let hits = directory.search(&query).unwrap_or_default();
        return ChatReply::listing(Intent::Category, &format!("Businesses in {category}:"), hits);
    }

    search(directory, &words)
}

fn tokenize(message: &str) -> Vec<String> {
    message
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Single words must match a whole token; phrases match anywhere.
fn mentions_any(message: &str, words: &[String], needles: &[&str]) -> bool {
    needles.iter().any(|needle| {
        if needle.contains(' ') {
            message.contains(needle)
        } else {
            words
                .iter()
                .any(|word| word == needle || word.strip_suffix('s') == Some(*needle))
        }
    })
}

fn describe(summary: &BusinessSummary) -> String {
    let mut line = format!(
        "- {} ({}, {:.1}/5)",
        summary.business.name, summary.business.category, summary.average_rating
    );
    if let Some(distance) = summary.distance {
        line.push_str(&format!(", {distance:.1} mi away"));
    }
    if summary.active_deals > 0 {
        line.push_str(", has deals");
    }
    line
}

fn deals(directory: &Directory) -> ChatReply {
    let active = directory.active_deals();
    if active.is_empty() {
        return ChatReply::text(Intent::Deals, "There are no active deals right now.");
    }

    let mut reply = String::from("Current deals:");
    let mut businesses: Vec<BusinessSummary> = Vec::new();
    for deal in active.into_iter().take(LIST_LIMIT) {
        let Ok(business) = directory.business(&deal.business_id) else {
            continue;
        };
        reply.push_str(&format!("\n- {}: {}", business.name, deal.title));
        if let Some(percent) = deal.discount_percent {
            reply.push_str(&format!(" ({percent}% off)"));
        }
        if !businesses.iter().any(|s| s.business.id == business.id) {
            businesses.push(directory.summarize(business, None));
        }
    }

    ChatReply {
        intent: Intent::Deals,
        reply,
        businesses,
    }
}

fn nearby(directory: &Directory, request: &ChatRequest) -> ChatReply {
    let origin = match (request.lat, request.lon) {
        (Some(lat), Some(lon)) => Coordinates { lat, lon },
        _ => {
            return ChatReply::text(
                Intent::Nearby,
                "Share your location and I can list places nearby.",
            );
        }
    };
    let query = SearchQuery {
        lat: Some(origin.lat),
        lon: Some(origin.lon),
        radius: Some(NEARBY_RADIUS_MILES),
        unit: Unit::Miles,
        sort: SortKey::Distance,
        limit: Some(LIST_LIMIT),
        ..SearchQuery::default()
    };

    match directory.search(&query) {
        Ok(hits) if hits.is_empty() => ChatReply::text(
            Intent::Nearby,
            format!("Nothing within {NEARBY_RADIUS_MILES} miles of you."),
        ),
        Ok(hits) => ChatReply::listing(Intent::Nearby, "Closest to you:", hits),
        Err(_) => ChatReply::text(Intent::Nearby, "That location doesn't look right."),
    }
}

fn hours(directory: &Directory, message: &str) -> Option<ChatReply> {
    let business = directory
        .businesses()
        .iter()
        .filter(|business| message.contains(&business.name.to_lowercase()))
        .max_by_key(|business| business.name.len())?;

    let reply = match &business.hours {
        Some(hours) => format!("{} is open {hours}.", business.name),
        None => format!("{} hasn't listed its hours.", business.name),
    };
    Some(ChatReply {
        intent: Intent::Hours,
        reply,
        businesses: vec![directory.summarize(business, None)],
    })
}

/// Whole-token match, so "seafood" does not mention "food". The last token
/// of the phrase may carry a plural `s`.
fn mentions_phrase(words: &[String], phrase: &[String]) -> bool {
    let Some((last, head)) = phrase.split_last() else {
        return false;
    };
    words.windows(phrase.len()).any(|window| {
        let (window_last, window_head) = (&window[phrase.len() - 1], &window[..phrase.len() - 1]);
        window_head == head
            && (window_last == last || window_last.strip_suffix('s') == Some(last.as_str()))
    })
}

fn mentioned_category(directory: &Directory, words: &[String]) -> Option<String> {
    directory
        .categories()
        .into_iter()
        .map(|category| category.name)
        .filter(|name| mentions_phrase(words, &tokenize(&name.to_lowercase())))
        .max_by_key(String::len)
}

fn top_rated(directory: &Directory, category: Option<String>) -> ChatReply {
    let heading = match &category {
        Some(category) => format!("Top rated in {category}:"),
        None => "Top rated overall:".to_string(),
    };
    let query = SearchQuery {
        category,
        sort: SortKey::Rating,
        limit: Some(TOP_LIMIT),
        ..SearchQuery::default()
    };
    let hits = directory.search(&query).unwrap_or_default();
    ChatReply::listing(Intent::TopRated, &heading, hits)
}

fn search(directory: &Directory, words: &[String]) -> ChatReply {
    let mut hits: Vec<BusinessSummary> = Vec::new();
    for word in words
        .iter()
        .filter(|word| word.len() >= 3 && !STOPWORDS.contains(&word.as_str()))
    {
        let query = SearchQuery {
            q: Some(word.clone()),
            ..SearchQuery::default()
        };
        for summary in directory.search(&query).unwrap_or_default() {
            if !hits.iter().any(|hit| hit.business.id == summary.business.id) {
                hits.push(summary);
            }
        }
    }
    hits.truncate(LIST_LIMIT);

    if hits.is_empty() {
        return ChatReply::text(
            Intent::Fallback,
            format!("Sorry, I couldn't find anything for that. {HELP_TEXT}"),
        );
    }
    ChatReply::listing(Intent::Search, "Here's what I found:", hits)
}

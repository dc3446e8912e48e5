#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use riverrun_engine::cards::{parse_cards, Card};
use riverrun_engine::config::TableConfig;
use riverrun_engine::deck::Deck;
use riverrun_engine::engine::PokerEngine;
use riverrun_engine::player::SeatedPlayer;
use riverrun_engine::variant::Variant;
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

pub fn cards(text: &str) -> Vec<Card> {
    parse_cards(text).expect("valid card text")
}

/// Players `ids[i]` in seat `i`, all with `stack`.
pub fn seats(ids: &[&str], stack: u64) -> Vec<SeatedPlayer> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| SeatedPlayer::new(*id, id.to_uppercase(), stack, i))
        .collect()
}

pub fn engine(variant: Variant, ids: &[&str], stack: u64, seed: u64) -> PokerEngine {
    let config = TableConfig::new("test-table", 5, 10)
        .with_variant(variant)
        .with_seed(seed);
    PokerEngine::new(config, seats(ids, stack)).expect("valid table")
}

/// Engine whose deck deals `order` first, top card first.
pub fn rigged(variant: Variant, ids: &[&str], stack: u64, order: &str) -> PokerEngine {
    engine(variant, ids, stack, 1).with_deck(Deck::stacked(cards(order)))
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

/// Captures tracing events emitted while a test body runs.
#[derive(Debug, Clone, Default)]
pub struct TestLogSubscriber {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn at_level(&self, level: Level) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }

    /// Runs `f` with this subscriber as the thread's default.
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
        let registry = Registry::default().with(TestLayer {
            entries: self.entries.clone(),
        });
        tracing::subscriber::with_default(registry, f)
    }
}

struct TestLayer {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl<S> Layer<S> for TestLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.entries.lock().unwrap().push(LogEntry {
            level: *event.metadata().level(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let value_str = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(value_str);
        } else {
            self.fields.push((field.name().to_string(), value_str));
        }
    }
}

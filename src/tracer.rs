// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::env;
use std::fmt::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::OnceCell;
use tracing::{field::Visit, Id, Level, Subscriber};
use tracing_core::Field;

pub const ENV_RUST_LOG: &str = "RUST_LOG";

struct StringVisitor<'a> {
    string: &'a mut String,
}

impl Visit for StringVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let _ = if field.name() == "message" {
            write!(self.string, "{value:?} ")
        } else {
            write!(self.string, "{} = {:?}; ", field.name(), value)
        };
    }
}

#[derive(Debug, PartialEq, Eq)]
struct LogFilter {
    target: Option<String>,
    level: Option<Level>,
}

impl LogFilter {
    fn matches(&self, metadata: &tracing::Metadata<'_>) -> bool {
        // a level admits itself and everything less verbose
        let level_ok = self.level.map_or(true, |level| metadata.level() <= &level);
        let target_ok = self
            .target
            .as_deref()
            .map_or(true, |target| metadata.target().starts_with(target));
        level_ok && target_ok
    }
}

/// Subscriber printing events to stderr, filtered by `RUST_LOG`.
///
/// Filters are comma separated and take the forms `level`, `target` or
/// `target=level`. Without `RUST_LOG` nothing is printed.
pub struct MinimalTracer {
    enabled: bool,
    filters: Vec<LogFilter>,
}

fn string_to_level(string: &str) -> Option<Level> {
    match string.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn parse_filters(value: &str) -> Vec<LogFilter> {
    value
        .split(',')
        .map(str::trim)
        .filter(|filter| !filter.is_empty())
        .map(|filter| match filter.split_once('=') {
            Some((target, level)) => LogFilter {
                target: Some(target.to_string()),
                level: string_to_level(level),
            },
            None => match string_to_level(filter) {
                Some(level) => LogFilter {
                    target: None,
                    level: Some(level),
                },
                None => LogFilter {
                    target: Some(filter.to_string()),
                    level: None,
                },
            },
        })
        .collect()
}

impl MinimalTracer {
    fn from_env() -> Self {
        match env::var(ENV_RUST_LOG) {
            Ok(value) => MinimalTracer {
                enabled: true,
                filters: parse_filters(&value),
            },
            Err(_) => MinimalTracer {
                enabled: false,
                filters: Vec::new(),
            },
        }
    }

    pub fn register() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
        tracing::subscriber::set_global_default(Self::from_env())
    }
}

static REGISTERED: OnceCell<()> = OnceCell::new();

/// Registers the tracer once per process. Later calls, and a failed
/// registration because another subscriber won, are ignored.
pub fn init() {
    REGISTERED.get_or_init(|| {
        let _ = MinimalTracer::register();
    });
}

static AUTO_ID: AtomicUsize = AtomicUsize::new(1);

impl Subscriber for MinimalTracer {
    fn enabled(&self, metadata: &tracing::Metadata<'_>) -> bool {
        self.enabled
            && (self.filters.is_empty() || self.filters.iter().any(|f| f.matches(metadata)))
    }

    fn new_span(&self, _span: &tracing_core::span::Attributes<'_>) -> tracing_core::span::Id {
        Id::from_u64(AUTO_ID.fetch_add(1, Ordering::Relaxed) as u64)
    }

    fn record(&self, _span: &tracing_core::span::Id, _values: &tracing_core::span::Record<'_>) {}

    fn record_follows_from(
        &self,
        _span: &tracing_core::span::Id,
        _follows: &tracing_core::span::Id,
    ) {
    }

    fn event(&self, event: &tracing::Event<'_>) {
        let metadata = event.metadata();
        let mut text = String::new();
        event.record(&mut StringVisitor { string: &mut text });
        eprintln!("{} {}: {}", metadata.level(), metadata.target(), text);
    }

    fn enter(&self, _span: &tracing_core::span::Id) {}

    fn exit(&self, _span: &tracing_core::span::Id) {}
}

use std::fmt;
use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::fmt::format::{FmtSpan, Writer};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{prelude::*, registry::Registry, EnvFilter, Layer};

use super::app_config::config;
use super::error::Result;

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
    pub use tracing::{debug_span, error_span, info_span, trace_span, warn_span};
    pub use tracing::{event, field::Empty, instrument, span};
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber as described by the `logging` config section.
///
/// `produces_output` tells whether the running command writes its own data
/// to stdout, in which case terminal outputs with `auto_switch` go to stderr.
pub fn setup(produces_output: bool) -> Result<GlobalLoggingContext> {
    let cfg: LoggingConfig = config().get("logging")?;
    GlobalLoggingContext::new(cfg, produces_output)
}

/// This needs to be hold in main, dropping it flushes the non-blocking writers
pub struct GlobalLoggingContext {
    _worker_guards: Vec<WorkerGuard>,
}

impl GlobalLoggingContext {
    fn new(cfg: LoggingConfig, produces_output: bool) -> Result<Self> {
        let mut guards = vec![];
        let layers: Vec<BoxedLayer> = cfg
            .outputs
            .iter()
            .filter(|output| output.enabled)
            .map(|output| {
                let (layer, guard) = new_layer(output, &cfg.filter, produces_output);
                guards.push(guard);
                layer
            })
            .collect();

        Registry::default().with(layers).try_init()?;

        Ok(Self { _worker_guards: guards })
    }
}

fn new_layer(output: &LoggingOutput, global_filter: &FilterConfig, produces_output: bool) -> (BoxedLayer, WorkerGuard) {
    let span_events = output
        .span_events
        .iter()
        .fold(FmtSpan::NONE, |f, e| f | (*e).into());

    let (writer, guard) = output.target.to_writer(produces_output);

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(output.target.supports_color())
        .with_target(false)
        .with_span_events(span_events)
        .with_timer(IsoTime)
        .with_writer(writer)
        .with_filter(output.filter.with_default(global_filter).to_env_filter())
        .boxed();

    (layer, guard)
}

struct IsoTime;

impl FormatTime for IsoTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ====== Config to Layer ======

impl FilterConfig {
    pub fn to_env_filter(&self) -> EnvFilter {
        let filter = match &self.from_env {
            Some(env) => EnvFilter::from_env(env),
            None => EnvFilter::default(),
        };

        match &self.directives {
            Some(dirs) => dirs
                .split(',')
                .filter_map(|s| match s.parse() {
                    Ok(d) => Some(d),
                    Err(err) => {
                        eprintln!("ignoring log directive `{}`: {}", s, err);
                        None
                    }
                })
                .fold(filter, |f, dir| f.add_directive(dir)),
            None => filter,
        }
    }

    pub fn with_default(&self, default: &FilterConfig) -> FilterConfig {
        Self {
            directives: self
                .directives
                .clone()
                .or_else(|| default.directives.clone()),
            from_env: self
                .from_env
                .clone()
                .or_else(|| default.from_env.clone()),
        }
    }

    pub fn empty() -> Self {
        Self {
            directives: None,
            from_env: None,
        }
    }
}

impl LoggingTarget {
    pub fn supports_color(&self) -> bool {
        matches!(self, LoggingTarget::Term(_))
    }

    pub fn to_writer(&self, produces_output: bool) -> (NonBlocking, WorkerGuard) {
        let builder = NonBlockingBuilder::default().lossy(false);
        match self {
            LoggingTarget::Term(term) => match term.name {
                TermTarget::Stdout if !term.auto_switch || !produces_output => builder.finish(std::io::stdout()),
                _ => builder.finish(std::io::stderr()),
            },
            LoggingTarget::File(file) => builder.finish(tracing_appender::rolling::never(&file.directory, &file.name)),
        }
    }
}

impl From<SpanEvent> for FmtSpan {
    fn from(e: SpanEvent) -> Self {
        match e {
            SpanEvent::New => FmtSpan::NEW,
            SpanEvent::Enter => FmtSpan::ENTER,
            SpanEvent::Exit => FmtSpan::EXIT,
            SpanEvent::Close => FmtSpan::CLOSE,
            SpanEvent::Active => FmtSpan::ACTIVE,
            SpanEvent::Full => FmtSpan::FULL,
        }
    }
}

// ====== Logging Config ======

#[derive(Debug, serde::Deserialize)]
struct LoggingConfig {
    #[serde(default)]
    filter: FilterConfig,
    #[serde(default)]
    outputs: Vec<LoggingOutput>,
}

#[derive(Debug, serde::Deserialize)]
struct FilterConfig {
    #[serde(default)]
    directives: Option<String>,
    #[serde(default, deserialize_with = "deserialize_filter_from_env")]
    from_env: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct LoggingOutput {
    enabled: bool,
    #[serde(default)]
    span_events: Vec<SpanEvent>,
    #[serde(default = "FilterConfig::empty")]
    filter: FilterConfig,
    target: LoggingTarget,
}

#[derive(Copy, Clone, Debug, serde::Deserialize)]
enum SpanEvent {
    New,
    Enter,
    Exit,
    Close,
    Active,
    Full,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
enum LoggingTarget {
    Term(TermOutput),
    File(FileOutput),
}

#[derive(Debug, serde::Deserialize)]
struct TermOutput {
    name: TermTarget,
    #[serde(default)]
    auto_switch: bool,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum TermTarget {
    Stdout,
    Stderr,
}

#[derive(Debug, serde::Deserialize)]
struct FileOutput {
    directory: PathBuf,
    name: PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            directives: Some("info".into()),
            from_env: Some("RUST_LOG".into()),
        }
    }
}

// ====== serde helpers ======

/// Deserialize `false` to `None`, `true` to `Some("RUST_LOG")`, and string to `Some(xxx)`
fn deserialize_filter_from_env<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct VisitFromEnv;

    impl<'de> serde::de::Visitor<'de> for VisitFromEnv {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("bool or env variable name")
        }

        fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(if value { Some("RUST_LOG".into()) } else { None })
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_owned()))
        }
    }

    deserializer.deserialize_any(VisitFromEnv)
}

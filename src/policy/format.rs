// src/policy/format.rs

//! Line format shared by every logger the crate installs.

use std::fmt;

use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::logging;
use crate::types::Identity;

pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Event formatter producing `[<component>][<operation>][<HH:MM:SS>] <message>`.
///
/// A root formatter takes its tag from [`logging::root_identity`] for every
/// event and, while no root-redirect scope is active, falls back to
/// `[<HH:MM:SS>] <LEVEL> <target>: <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    tag: Tag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tag {
    Fixed(Identity),
    Root,
}

impl LineFormat {
    /// Format of the process-wide root logger.
    pub fn root() -> Self {
        Self { tag: Tag::Root }
    }

    pub fn tagged(identity: Identity) -> Self {
        Self {
            tag: Tag::Fixed(identity),
        }
    }

    /// The tag the next event would be printed with.
    pub fn identity(&self) -> Option<Identity> {
        match &self.tag {
            Tag::Fixed(identity) => Some(identity.clone()),
            Tag::Root => logging::root_identity(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let now = Local::now().format(TIME_FORMAT);

        match self.identity() {
            Some(id) => write!(writer, "[{}][{}][{}] ", id.component, id.operation, now)?,
            None => {
                let meta = event.metadata();
                write!(writer, "[{}] {} {}: ", now, meta.level(), meta.target())?
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

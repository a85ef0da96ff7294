//! Input scripts for headless simulation.
//!
//! A script is a comma-separated list of entries:
//!
//! - `KEY:START-END` holds `KEY` from frame `START` until frame `END`.
//! - `KEY:START` holds `KEY` from frame `START` to the end of the run.
//! - `turn:FRAME[:DX[:DY]]` moves the mouse by `(DX, DY)` at `FRAME`
//!   (default `(1, 0)`).
//!
//! Events scheduled for a frame reach the router before that frame updates.

use anyhow::{Context, Result, bail};
use cubefield_input::{InputRouter, LogicalKey};

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEvent {
    KeyDown(LogicalKey),
    KeyUp(LogicalKey),
    Mouse { dx: f32, dy: f32 },
}

#[derive(Debug, Clone, PartialEq)]
struct Scheduled {
    frame: u32,
    event: ScriptEvent,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputScript {
    events: Vec<Scheduled>,
}

impl InputScript {
    pub fn parse(source: &str) -> Result<Self> {
        let mut events = Vec::new();
        for entry in source.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            parse_entry(entry, &mut events).with_context(|| format!("bad script entry `{entry}`"))?;
        }
        // Stable sort keeps the written order within a frame.
        events.sort_by_key(|s| s.frame);
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events scheduled for `frame`, in script order.
    pub fn events_at(&self, frame: u32) -> impl Iterator<Item = &ScriptEvent> {
        self.events
            .iter()
            .filter(move |s| s.frame == frame)
            .map(|s| &s.event)
    }

    /// Feed the events for `frame` into `router`.
    pub fn feed(&self, frame: u32, router: &mut InputRouter) {
        for event in self.events_at(frame) {
            match event {
                ScriptEvent::KeyDown(key) => {
                    router.key_down(key.clone());
                }
                ScriptEvent::KeyUp(key) => {
                    router.key_up(key.clone());
                }
                ScriptEvent::Mouse { dx, dy } => {
                    router.mouse_moved(*dx, *dy);
                }
            }
        }
    }
}

fn parse_entry(entry: &str, out: &mut Vec<Scheduled>) -> Result<()> {
    let mut parts = entry.split(':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        bail!("missing key name");
    }
    let timing = parts.next().context("missing frame")?.trim();

    if name.eq_ignore_ascii_case("turn") {
        let frame = parse_frame(timing)?;
        let dx = parts.next().map(parse_float).transpose()?.unwrap_or(1.0);
        let dy = parts.next().map(parse_float).transpose()?.unwrap_or(0.0);
        if parts.next().is_some() {
            bail!("too many fields");
        }
        out.push(Scheduled {
            frame,
            event: ScriptEvent::Mouse { dx, dy },
        });
        return Ok(());
    }

    if parts.next().is_some() {
        bail!("too many fields");
    }

    let key = LogicalKey::new(name);
    match timing.split_once('-') {
        Some((start, end)) => {
            let start = parse_frame(start)?;
            let end = parse_frame(end)?;
            if end <= start {
                bail!("release frame {end} is not after press frame {start}");
            }
            out.push(Scheduled {
                frame: start,
                event: ScriptEvent::KeyDown(key.clone()),
            });
            out.push(Scheduled {
                frame: end,
                event: ScriptEvent::KeyUp(key),
            });
        }
        None => out.push(Scheduled {
            frame: parse_frame(timing)?,
            event: ScriptEvent::KeyDown(key),
        }),
    }
    Ok(())
}

fn parse_frame(text: &str) -> Result<u32> {
    text.trim()
        .parse()
        .with_context(|| format!("invalid frame `{text}`"))
}

fn parse_float(text: &str) -> Result<f32> {
    text.trim()
        .parse()
        .with_context(|| format!("invalid number `{text}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubefield_common::Movement;
    use cubefield_input::Action;

    #[test]
    fn parses_holds_and_turns() {
        let script = InputScript::parse("w:0-30, d:10-20,turn:5").unwrap();
        assert_eq!(script.len(), 5);

        let first: Vec<_> = script.events_at(0).collect();
        assert_eq!(first, vec![&ScriptEvent::KeyDown(LogicalKey::new("w"))]);

        let turn: Vec<_> = script.events_at(5).collect();
        assert_eq!(turn, vec![&ScriptEvent::Mouse { dx: 1.0, dy: 0.0 }]);

        let release: Vec<_> = script.events_at(30).collect();
        assert_eq!(release, vec![&ScriptEvent::KeyUp(LogicalKey::new("w"))]);
    }

    #[test]
    fn open_ended_hold_and_explicit_turn() {
        let script = InputScript::parse("S:3,turn:4:-2:0.5").unwrap();
        assert_eq!(
            script.events_at(3).collect::<Vec<_>>(),
            vec![&ScriptEvent::KeyDown(LogicalKey::new("s"))]
        );
        assert_eq!(
            script.events_at(4).collect::<Vec<_>>(),
            vec![&ScriptEvent::Mouse { dx: -2.0, dy: 0.5 }]
        );
    }

    #[test]
    fn empty_script() {
        assert!(InputScript::parse("").unwrap().is_empty());
        assert!(InputScript::parse(" , ").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(InputScript::parse("w").is_err());
        assert!(InputScript::parse("w:x-3").is_err());
        assert!(InputScript::parse("w:5-5").is_err());
        assert!(InputScript::parse("w:1-2:3").is_err());
        assert!(InputScript::parse("turn:1:a").is_err());
        assert!(InputScript::parse(":3").is_err());
    }

    #[test]
    fn feeds_router_in_frame_order() {
        let script = InputScript::parse("w:0-2,turn:0").unwrap();
        let mut router = InputRouter::with_default_bindings();
        router.set_pointer_captured(true);

        script.feed(0, &mut router);
        let actions: Vec<_> = router.drain().collect();
        assert_eq!(actions[0], Action::Move(Movement::Forward));
        assert!(matches!(actions[1], Action::Turn(_)));

        script.feed(1, &mut router);
        assert_eq!(router.pending_len(), 0);

        script.feed(2, &mut router);
        assert_eq!(
            router.drain().collect::<Vec<_>>(),
            vec![Action::Stop(Movement::Forward)]
        );
    }
}

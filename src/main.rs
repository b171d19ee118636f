//! Scripted walk-through of the overlay against the simulated host.
//!
//! Runs a fixed session (feed, thread, template pick, send, host re-render,
//! second thread, leave) and prints the notices and the final document.

use anyhow::{Context, Result};
use bridge::{BridgeConfig, Integration, SubmitOutcome};
use bus::{NoticeBus, Severity};
use clap::Parser;
use composer::{CompositionSurface, SurfaceAction};
use host_dom::{HostDocument, Selector};
use host_sim::{HostApp, HostOptions};
use std::path::PathBuf;

/// Drive the composer overlay through a scripted host session.
#[derive(Parser, Debug)]
#[command(name = "composer_overlay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML file overriding selectors and scope
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Frames the host takes to render its composer
    #[arg(long, value_name = "FRAMES", default_value_t = 3)]
    composer_delay: u32,

    /// Host origin to start from
    #[arg(long, value_name = "URL", default_value = "https://host.test/feed/")]
    start: String,

    /// Lines of the final document outline to print
    #[arg(long, value_name = "LINES", default_value_t = 60)]
    outline: usize,
}

struct Demo {
    host: HostApp,
    integration: Integration,
    surface: CompositionSurface,
    bus: NoticeBus,
}

impl Demo {
    fn frames(&mut self, n: usize) {
        for _ in 0..n {
            if let Err(err) = self.host.tick() {
                log::error!("host frame failed: {err}");
            }
            let report = self
                .integration
                .on_frame(self.host.doc_mut(), &mut self.surface);
            if let Some(nav) = &report.navigated {
                println!("[frame {}] navigated to {}", report.frame.0, nav.to);
            }
            for event in &report.events {
                println!("[frame {}] {event:?}", report.frame.0);
            }
            self.flush_notices();
        }
    }

    fn click(&mut self, selector: &str) -> Result<Option<SubmitOutcome>> {
        let selector = Selector::parse(selector)?;
        let target = self
            .host
            .doc()
            .query_selector(&selector)
            .with_context(|| format!("nothing matches `{selector}`"))?;
        let Some(action) = self.surface.action_at(self.host.doc(), target) else {
            return Ok(None);
        };
        let bridge = self.integration.bridge().clone();
        let outcome = self.surface.apply(self.host.doc_mut(), &bridge, action);
        self.flush_notices();
        Ok(outcome)
    }

    fn flush_notices(&self) {
        for notice in self.bus.drain() {
            let tag = match notice.severity() {
                Severity::Success => "ok",
                Severity::Info => "..",
                Severity::Error => "!!",
            };
            println!("  ({tag}) {}", notice.message());
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    log::info!("scope `{}`", config.scope_pattern);

    let bus = NoticeBus::new();
    let mut demo = Demo {
        host: HostApp::new(
            &cli.start,
            HostOptions {
                composer_delay: cli.composer_delay,
            },
        )?,
        integration: Integration::new(&config)?,
        surface: CompositionSurface::new(bus.sender()),
        bus,
    };

    for event in demo
        .integration
        .start(demo.host.doc_mut(), &mut demo.surface)
    {
        println!("[start] {event:?}");
    }
    demo.frames(2);

    demo.host.navigate("/messaging/thread/42/")?;
    demo.frames(cli.composer_delay as usize + 2);

    if demo.integration.mount_record().is_none() {
        println!("overlay never mounted; check the composer selector");
    } else {
        demo.click(".overlay-composer__template-toggle")?;
        demo.click("li[data-action=select-template]")?;
        if let Some(outcome) = demo.click(".overlay-composer__send")? {
            println!("submit: {outcome:?}");
        }
        demo.frames(1);

        let bridge = demo.integration.bridge().clone();
        if let Some(outcome) =
            demo.surface
                .apply(demo.host.doc_mut(), &bridge, SurfaceAction::Send)
        {
            println!("empty submit: {outcome:?}");
        }
        demo.flush_notices();

        demo.surface.set_draft("Following up on the thread.");
        demo.host.rerender_composer()?;
        demo.frames(1);
        demo.click(".overlay-composer__send")?;
        demo.frames(1);
    }

    demo.host.navigate("/feed/")?;
    demo.frames(1);
    for event in demo.integration.stop(demo.host.doc_mut()) {
        println!("[stop] {event:?}");
    }

    println!();
    println!("host sent {} message(s):", demo.host.sent().len());
    for text in demo.host.sent() {
        println!("  - {text}");
    }
    println!();
    for line in demo.host.doc().outline(cli.outline) {
        println!("{line}");
    }
    Ok(())
}

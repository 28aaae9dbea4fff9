use std::time::Duration;

use color_eyre::eyre::Result;
use futures::StreamExt;
use ratatui::{Terminal, prelude::Backend};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    application::Application,
    command::{Action, Command},
    subscription::SubscriptionManager,
};

/// Drives an [`Application`]: applies messages, runs commands, keeps
/// subscriptions in sync and redraws the terminal.
///
/// Messages are applied one at a time on the task that calls [`Runtime::run`];
/// commands and subscriptions run as separate tasks and only talk back through
/// the message channel.
pub struct Runtime<A: Application> {
    app: A,
    init: Option<Command<A::Message>>,
    tx: mpsc::UnboundedSender<Action<A::Message>>,
    rx: mpsc::UnboundedReceiver<Action<A::Message>>,
    subscriptions: SubscriptionManager<A::Message>,
}

/// Time between frames, at least one millisecond.
fn frame_period(frame_rate: u32) -> Duration {
    (Duration::from_secs(1) / frame_rate.max(1)).max(Duration::from_millis(1))
}

impl<A: Application> Runtime<A> {
    /// Creates the application from `flags`. Nothing runs until [`Runtime::run`].
    pub fn new(flags: A::Flags) -> Self {
        let (app, init) = A::new(flags);
        let (tx, rx) = mpsc::unbounded_channel();
        let subscriptions = SubscriptionManager::new(tx.clone());

        Self {
            app,
            init: Some(init),
            tx,
            rx,
            subscriptions,
        }
    }

    fn execute(&self, cmd: Command<A::Message>) {
        if let Some(mut stream) = cmd.stream {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                while let Some(action) = stream.next().await {
                    if tx.send(action).is_err() {
                        break;
                    }
                }
            });
        }
    }

    /// Applies every queued message. Returns `false` once quit was requested.
    fn drain(&mut self, first: Action<A::Message>) -> bool {
        let mut next = Some(first);
        while let Some(action) = next {
            match action {
                Action::Message(msg) => {
                    let cmd = self.app.update(msg);
                    self.execute(cmd);
                }
                Action::Quit => return false,
            }
            next = self.rx.try_recv().ok();
        }
        self.subscriptions.update(self.app.subscriptions());
        true
    }

    /// Runs the event loop until the application emits [`Action::Quit`].
    ///
    /// The terminal is redrawn at most `frame_rate` times per second (capped
    /// at 1000) and only after something changed.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing to the terminal fails.
    pub async fn run<B: Backend>(mut self, terminal: &mut Terminal<B>, frame_rate: u32) -> Result<()> {
        let mut ticker = interval(frame_period(frame_rate));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.subscriptions.update(self.app.subscriptions());
        if let Some(init) = self.init.take() {
            self.execute(init);
        }

        let mut dirty = true;
        loop {
            tokio::select! {
                action = self.rx.recv() => {
                    // The runtime holds a sender, so the channel never closes.
                    let Some(action) = action else { break };
                    if !self.drain(action) {
                        break;
                    }
                    dirty = true;
                }
                _ = ticker.tick() => {
                    if dirty {
                        terminal.draw(|frame| self.app.view(frame))?;
                        dirty = false;
                    }
                }
            }
        }

        self.subscriptions.shutdown().await;
        Ok(())
    }
}

//! Interactive terminal view

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::booking::BookingEvent;
use crate::commands::{self, Command, HELP};
use crate::state::AppState;
use crate::viewmodel::{catalog, render_toast, status_line, team_items, ToastItem};

/// Run until `quit` or end of input
pub async fn run(app: &mut AppState) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut output = EventOutput::new();

    if app.bookings.load().await.is_err() {
        warn!("Booking task stopped before the first load");
        return;
    }
    println!("Slotbook: {} as {}. Type 'help' for commands.", app.config.collection, app.config.actor);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read input");
                        break;
                    }
                };

                let command = match commands::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(message) => {
                        println!("{}", message);
                        continue;
                    }
                };
                debug!(?command, "Command");

                let sent = match command {
                    Command::Show => {
                        show(app).await;
                        Ok(())
                    }
                    Command::Help => {
                        println!("{}", HELP);
                        Ok(())
                    }
                    Command::Quit => break,
                    Command::Reload => {
                        output.expect_listing();
                        app.bookings.load().await
                    }
                    Command::Select { key, kind } => app.bookings.select(key, kind).await,
                    Command::Confirm => app.bookings.confirm().await,
                    Command::Cancel => app.bookings.cancel().await,
                };
                if let Err(e) = sent {
                    warn!(error = e, "Command not delivered");
                    break;
                }
            }

            event = app.bookings.next_event() => {
                let Some(event) = event else {
                    break;
                };
                match output.on_event(event) {
                    Some(Output::Line(line)) => println!("{}", line),
                    Some(Output::Listing) => show(app).await,
                    None => {}
                }
            }
        }
    }
}

/// What to print for a booking event
#[derive(Debug, Clone, PartialEq, Eq)]
enum Output {
    Line(String),
    Listing,
}

/// Turns booking events into terminal output
///
/// The listing is printed once after a requested load. A failed load is
/// reported by its notification alone.
struct EventOutput {
    listing_pending: bool,
}

impl EventOutput {
    fn new() -> Self {
        Self {
            listing_pending: true,
        }
    }

    fn expect_listing(&mut self) {
        self.listing_pending = true;
    }

    fn on_event(&mut self, event: BookingEvent) -> Option<Output> {
        match event {
            BookingEvent::StateChanged(state) => Some(Output::Line(status_line(&state))),
            BookingEvent::ProjectionUpdated if self.listing_pending => {
                self.listing_pending = false;
                Some(Output::Listing)
            }
            BookingEvent::ProjectionUpdated => None,
            BookingEvent::Notification(n) => {
                Some(Output::Line(render_toast(&ToastItem::from(&n))))
            }
            BookingEvent::LoadFailed(_) => {
                self.listing_pending = false;
                None
            }
        }
    }
}

async fn show(app: &AppState) {
    let snapshot = app.bookings.snapshot().await;
    if let Some(reason) = &snapshot.load_error {
        println!("Slots are unavailable ({}). Type 'reload' to try again.", reason);
        return;
    }
    let teams = team_items(&snapshot.projection, &snapshot.state, &app.config.actor);
    print!("{}", catalog::render(&teams));
    println!("{}", status_line(&snapshot.state));
}

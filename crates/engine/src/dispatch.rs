//! Event dispatcher: routes each inbound event to the active wizard's step
//! handler, or to an entry trigger / stateless command.
//!
//! Per-event errors are caught here and become a user-visible message plus
//! a log entry, with the session left in its pre-error step. Nothing in
//! this path is fatal to the process except an operator-issued restart.

use std::sync::Arc;

use armory_domain::UserId;
use armory_shared::{Envelope, InboundEvent, Reply};

use crate::app::App;
use crate::commands;
use crate::errors::HandlerError;
use crate::render::{self, BTN_ADD, BTN_BROWSE, BTN_HOME};
use crate::session::{Session, WizardState};
use crate::wizards::Flow;

/// What the run loop should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    /// Terminate the process; the supervisor restarts it.
    Shutdown,
}

pub struct Dispatcher {
    app: Arc<App>,
}

impl Dispatcher {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    pub async fn dispatch(&self, envelope: Envelope) -> DispatchOutcome {
        let user = envelope.user_id;
        let session_handle = self.app.sessions.session(user);
        let mut session = session_handle.lock().await;

        match self.route(&mut session, &envelope).await {
            Ok((replies, outcome)) => {
                self.send_all(user, replies).await;
                outcome
            }
            Err(e) => {
                tracing::error!(user = %user, "Event handling failed: {e}");
                self.send_all(user, vec![Reply::text(e.user_message())]).await;
                DispatchOutcome::Continue
            }
        }
    }

    async fn route(
        &self,
        session: &mut Session,
        envelope: &Envelope,
    ) -> Result<(Vec<Reply>, DispatchOutcome), HandlerError> {
        let user = envelope.user_id;
        let is_admin = self.app.config.is_allowed(user);

        // Global triggers work from any state, wizard or not.
        match &envelope.event {
            InboundEvent::Command { name } if name == "start" || name == "home" => {
                session.reset();
                return Ok((commands::greeting(is_admin), DispatchOutcome::Continue));
            }
            InboundEvent::Text { content } if content.trim() == BTN_HOME => {
                session.reset();
                return Ok((commands::greeting(is_admin), DispatchOutcome::Continue));
            }
            InboundEvent::Command { name } if name == "cancel" => {
                session.reset();
                return Ok((
                    vec![Reply::text_with_keyboard(
                        "Action cancelled.",
                        render::main_menu(is_admin),
                    )],
                    DispatchOutcome::Continue,
                ));
            }
            InboundEvent::Command { name } if name == "help" => {
                return Ok((commands::help(), DispatchOutcome::Continue));
            }
            InboundEvent::Command { name } if name == "restart" => {
                if !is_admin {
                    return Ok((denial(), DispatchOutcome::Continue));
                }
                session.reset();
                return shutdown_with_marker(user, &self.app).await;
            }
            InboundEvent::Command { name } if name == "update" => {
                if !is_admin {
                    return Ok((denial(), DispatchOutcome::Continue));
                }
                let mut replies = vec![Reply::text("Fetching updates...")];
                replies.extend(commands::run_update(self.app.config.update_cmd.as_deref()).await);
                let (shutdown_replies, outcome) = shutdown_with_marker(user, &self.app).await?;
                replies.extend(shutdown_replies);
                return Ok((replies, outcome));
            }
            // The browse trigger (re)starts browsing even mid-wizard.
            InboundEvent::Text { content } if content.trim() == BTN_BROWSE => {
                let (state, replies) = self.app.browse.start().await?;
                session.wizard = match state {
                    Some(state) => WizardState::Browse(state),
                    None => WizardState::Idle,
                };
                return Ok((replies, DispatchOutcome::Continue));
            }
            _ => {}
        }

        // Active wizard gets the event next.
        match &mut session.wizard {
            WizardState::Create(state) => {
                let flow = self
                    .app
                    .create
                    .handle(state, &envelope.display_name, &envelope.event)
                    .await?;
                return Ok((self.apply_flow(session, flow, is_admin), DispatchOutcome::Continue));
            }
            WizardState::Browse(state) => {
                let flow = self.app.browse.handle(state, &envelope.event).await?;
                return Ok((self.apply_flow(session, flow, is_admin), DispatchOutcome::Continue));
            }
            WizardState::Delete(state) => {
                let flow = self.app.delete.handle(state, &envelope.event).await?;
                return Ok((self.apply_flow(session, flow, is_admin), DispatchOutcome::Continue));
            }
            WizardState::Idle => {}
        }

        // No session: entry triggers and stateless commands.
        let replies = match &envelope.event {
            InboundEvent::Text { content } if content.trim() == BTN_ADD => {
                self.enter_create(session, is_admin)
            }
            InboundEvent::Command { name } => match name.as_str() {
                "add" => self.enter_create(session, is_admin),
                "delete" => {
                    if !is_admin {
                        // Denied users get no identifier map.
                        denial()
                    } else {
                        let (state, replies) = self.app.delete.start().await?;
                        if let Some(state) = state {
                            session.wizard = WizardState::Delete(state);
                        }
                        replies
                    }
                }
                "show_all" => {
                    if is_admin {
                        commands::show_all(self.app.catalog.as_ref()).await?
                    } else {
                        denial()
                    }
                }
                "status" => {
                    if is_admin {
                        commands::status(self.app.catalog.as_ref()).await?
                    } else {
                        denial()
                    }
                }
                "log" => {
                    if is_admin {
                        commands::log_excerpt(self.app.config.log_file.as_deref()).await
                    } else {
                        denial()
                    }
                }
                _ => vec![Reply::text("I don't know that command.")],
            },
            InboundEvent::Text { .. } | InboundEvent::Choice { .. } | InboundEvent::Image { .. } => {
                vec![Reply::text_with_keyboard(
                    "I don't understand that. Use the buttons or commands.",
                    render::main_menu(is_admin),
                )]
            }
        };
        Ok((replies, DispatchOutcome::Continue))
    }

    fn enter_create(&self, session: &mut Session, is_admin: bool) -> Vec<Reply> {
        if !is_admin {
            return vec![Reply::text_with_keyboard(
                "You don't have permission to add builds.",
                render::main_menu(false),
            )];
        }
        let (state, replies) = self.app.create.start();
        session.wizard = WizardState::Create(state);
        replies
    }

    /// Apply a wizard's flow decision to the session.
    fn apply_flow(&self, session: &mut Session, flow: Flow, is_admin: bool) -> Vec<Reply> {
        match flow {
            Flow::Continue(replies) => replies,
            Flow::Done(replies) => {
                session.reset();
                replies
            }
            Flow::Home(mut replies) => {
                session.reset();
                replies.extend(commands::greeting(is_admin));
                replies
            }
        }
    }

    /// Send every reply, logging transport failures without retrying.
    async fn send_all(&self, user: UserId, replies: Vec<Reply>) {
        for reply in replies {
            let result = match &reply {
                Reply::Text { body, keyboard } => {
                    self.app.chat.send_text(user, body, keyboard.as_ref()).await
                }
                Reply::Image {
                    asset,
                    caption,
                    keyboard,
                } => {
                    self.app
                        .chat
                        .send_image(user, asset, caption, keyboard.as_ref())
                        .await
                }
                Reply::Choices { prompt, options } => {
                    self.app.chat.present_choices(user, prompt, options).await
                }
            };
            if let Err(e) = result {
                tracing::warn!(user = %user, "Failed to send reply: {e}");
            }
        }
    }
}

/// Write the restart marker and ask the run loop to terminate.
async fn shutdown_with_marker(
    user: UserId,
    app: &App,
) -> Result<(Vec<Reply>, DispatchOutcome), HandlerError> {
    if let Err(e) = app.restart_marker.write(user).await {
        tracing::warn!("Failed to write restart marker: {e}");
    }
    Ok((
        vec![Reply::text(
            "Restarting...\nBack in a few seconds.",
        )],
        DispatchOutcome::Shutdown,
    ))
}

fn denial() -> Vec<Reply> {
    vec![Reply::text("You don't have permission for this command.")]
}

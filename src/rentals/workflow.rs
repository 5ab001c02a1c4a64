use statig::prelude::*;
use std::fmt;
use tracing::{debug, error, info, Instrument};

use super::service::RentalService;
use super::state_machine::{current_step, RentalEvent, RentalFlow, Step};
use crate::cancel::CancelScope;
use crate::models::Motorcycle;
use crate::telemetry::{create_rental_span, generate_correlation_id};
use crate::{FleetError, Result};

/// The screen the rental flow is showing, with the selection it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Home,
    SelectMotorcycle,
    SelectClient { motorcycle_id: String },
    RentalDetails { motorcycle_id: String },
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Home => f.write_str("home"),
            Screen::SelectMotorcycle => f.write_str("select-motorcycle"),
            Screen::SelectClient { .. } => f.write_str("select-client"),
            Screen::RentalDetails { .. } => f.write_str("rental-details"),
        }
    }
}

/// Drives the rental state machine against the store.
///
/// Every user action validates against the current screen, performs at most
/// one store write, and only then feeds the matching event to the machine.
/// A failed write is logged and returned; the screen stays where it was.
pub struct RentalWorkflow {
    machine: StateMachine<RentalFlow>,
    service: RentalService,
    scope: CancelScope,
    correlation_id: String,
}

impl RentalWorkflow {
    pub fn new(service: RentalService) -> Self {
        Self {
            machine: RentalFlow::new().state_machine(),
            service,
            scope: CancelScope::new(),
            correlation_id: generate_correlation_id(),
        }
    }

    pub fn service(&self) -> &RentalService {
        &self.service
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Cancellation scope owned by the current screen.
    ///
    /// Cancelling it makes any action still in flight drop its result.
    pub fn scope(&self) -> CancelScope {
        self.scope.clone()
    }

    pub fn screen(&self) -> Screen {
        let flow = self.machine.inner();
        match current_step(&self.machine) {
            Step::Home => Screen::Home,
            Step::SelectMotorcycle => Screen::SelectMotorcycle,
            Step::SelectClient => Screen::SelectClient {
                motorcycle_id: flow.selected_motorcycle().unwrap_or_default().to_string(),
            },
            Step::RentalDetails => Screen::RentalDetails {
                motorcycle_id: flow.opened_rental().unwrap_or_default().to_string(),
            },
        }
    }

    /// Home: begin a new rental.
    pub async fn start_rental(&mut self) -> Result<Screen> {
        self.expect_screen("start rental", |s| matches!(s, Screen::Home))?;
        Ok(self.dispatch(RentalEvent::NewRental))
    }

    /// Motorcycles offered on the select-motorcycle screen.
    pub async fn motorcycle_choices(&self) -> Result<Vec<Motorcycle>> {
        self.service.available_motorcycles().await
    }

    /// Select-motorcycle: pick the motorcycle to rent.
    pub async fn pick_motorcycle(&mut self, motorcycle_id: &str) -> Result<Screen> {
        self.expect_screen("pick motorcycle", |s| matches!(s, Screen::SelectMotorcycle))?;
        let scope = self.scope();
        let span = create_rental_span("pick_motorcycle", Some(motorcycle_id), &self.correlation_id);

        let checked = self
            .service
            .require_available(motorcycle_id)
            .instrument(span)
            .await;
        let motorcycle = self.settle("pick motorcycle", checked)?;
        let Some(motorcycle) = scope.admit(motorcycle) else {
            debug!(motorcycle.id = %motorcycle_id, "Pick arrived after cancellation, discarded");
            return Ok(self.screen());
        };

        Ok(self.dispatch(RentalEvent::MotorcyclePicked {
            motorcycle_id: motorcycle.id,
            available: motorcycle.is_available,
        }))
    }

    /// Select-client: pick the renter and commit the assignment.
    pub async fn pick_client(&mut self, client_id: &str) -> Result<Screen> {
        let motorcycle_id = match self.screen() {
            Screen::SelectClient { motorcycle_id } => motorcycle_id,
            other => return Err(invalid("pick client", &other)),
        };
        let scope = self.scope();
        let span = create_rental_span("assign_rental", Some(motorcycle_id.as_str()), &self.correlation_id);

        let committed = self
            .service
            .assign_rental(&motorcycle_id, client_id)
            .instrument(span)
            .await;
        let motorcycle = self.settle("assign rental", committed)?;
        if scope.admit(()).is_none() {
            debug!(motorcycle.id = %motorcycle.id, "Assignment finished after cancellation, screen kept");
            return Ok(self.screen());
        }

        info!(
            correlation.id = %self.correlation_id,
            motorcycle.id = %motorcycle.id,
            client.id = %client_id,
            "Motorcycle rented"
        );
        Ok(self.dispatch(RentalEvent::RentalCommitted {
            client_id: client_id.to_string(),
        }))
    }

    /// Home: open the details of an active rental.
    pub async fn open_rental(&mut self, motorcycle_id: &str) -> Result<Screen> {
        self.expect_screen("open rental", |s| matches!(s, Screen::Home))?;
        let scope = self.scope();

        let details = self.service.rental_details(motorcycle_id).await;
        let details = self.settle("open rental", details)?;
        if scope.admit(()).is_none() {
            return Ok(self.screen());
        }

        Ok(self.dispatch(RentalEvent::RentalOpened {
            motorcycle_id: details.motorcycle.id,
        }))
    }

    /// Rental details: mark the motorcycle returned.
    pub async fn return_rental(&mut self) -> Result<Screen> {
        let motorcycle_id = match self.screen() {
            Screen::RentalDetails { motorcycle_id } => motorcycle_id,
            other => return Err(invalid("return rental", &other)),
        };
        let scope = self.scope();
        let span = create_rental_span("return_rental", Some(motorcycle_id.as_str()), &self.correlation_id);

        let returned = self
            .service
            .return_rental(&motorcycle_id)
            .instrument(span)
            .await;
        self.settle("return rental", returned)?;
        if scope.admit(()).is_none() {
            debug!(motorcycle.id = %motorcycle_id, "Return finished after cancellation, screen kept");
            return Ok(self.screen());
        }

        info!(correlation.id = %self.correlation_id, motorcycle.id = %motorcycle_id, "Motorcycle returned");
        Ok(self.dispatch(RentalEvent::RentalReturned))
    }

    /// Leave the current screen for home without touching any record.
    pub fn back(&mut self) -> Screen {
        self.dispatch(RentalEvent::Back)
    }

    fn dispatch(&mut self, event: RentalEvent) -> Screen {
        let before = self.screen();
        self.machine.handle(&event);
        let after = self.screen();
        if before != after {
            // The old screen's pending work must not land on the new one.
            self.scope.cancel();
            self.scope = CancelScope::new();
            debug!(from = %before, to = %after, "Rental screen changed");
        }
        after
    }

    fn expect_screen(&self, action: &'static str, allowed: impl Fn(&Screen) -> bool) -> Result<()> {
        let screen = self.screen();
        if allowed(&screen) {
            Ok(())
        } else {
            Err(invalid(action, &screen))
        }
    }

    fn settle<T>(&self, action: &str, outcome: Result<T>) -> Result<T> {
        outcome.map_err(|e| {
            error!(
                correlation.id = %self.correlation_id,
                screen = %self.screen(),
                action = action,
                error = %e,
                "Rental action failed, screen unchanged"
            );
            e
        })
    }
}

fn invalid(action: &'static str, screen: &Screen) -> FleetError {
    FleetError::InvalidTransition {
        action,
        screen: screen.to_string(),
    }
}

impl fmt::Debug for RentalWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RentalWorkflow")
            .field("screen", &self.screen())
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

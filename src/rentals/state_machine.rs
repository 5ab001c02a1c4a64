use statig::prelude::*;

/// Inputs to the rental flow.
///
/// Commit events (`RentalCommitted`, `RentalReturned`) are only dispatched
/// after the corresponding store write has succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RentalEvent {
    NewRental,
    MotorcyclePicked { motorcycle_id: String, available: bool },
    RentalCommitted { client_id: String },
    RentalOpened { motorcycle_id: String },
    RentalReturned,
    Back,
}

/// Selection context carried between screens.
#[derive(Debug, Default)]
pub struct RentalFlow {
    pub selected_motorcycle: Option<String>,
    pub opened_rental: Option<String>,
}

impl RentalFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_motorcycle(&self) -> Option<&str> {
        self.selected_motorcycle.as_deref()
    }

    pub fn opened_rental(&self) -> Option<&str> {
        self.opened_rental.as_deref()
    }

    fn clear(&mut self) {
        self.selected_motorcycle = None;
        self.opened_rental = None;
    }
}

/// Which screen the flow is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Home,
    SelectMotorcycle,
    SelectClient,
    RentalDetails,
}

pub fn current_step(machine: &StateMachine<RentalFlow>) -> Step {
    match machine.state() {
        State::Home { .. } => Step::Home,
        State::SelectMotorcycle { .. } => Step::SelectMotorcycle,
        State::SelectClient { .. } => Step::SelectClient,
        State::RentalDetails { .. } => Step::RentalDetails,
    }
}

#[state_machine(
    initial = "State::home()",
    state(derive(Debug, Clone, PartialEq, Eq))
)]
impl RentalFlow {
    #[state]
    fn home(&mut self, event: &RentalEvent) -> Outcome<State> {
        match event {
            RentalEvent::NewRental => {
                self.clear();
                tracing::debug!("Rental flow started");
                Transition(State::select_motorcycle())
            }
            RentalEvent::RentalOpened { motorcycle_id } => {
                self.opened_rental = Some(motorcycle_id.clone());
                tracing::debug!(motorcycle.id = %motorcycle_id, "Rental opened");
                Transition(State::rental_details())
            }
            _ => Handled,
        }
    }

    #[state]
    fn select_motorcycle(&mut self, event: &RentalEvent) -> Outcome<State> {
        match event {
            RentalEvent::MotorcyclePicked {
                motorcycle_id,
                available,
            } => {
                if !*available {
                    tracing::warn!(motorcycle.id = %motorcycle_id, "Unavailable motorcycle picked");
                    return Handled;
                }
                self.selected_motorcycle = Some(motorcycle_id.clone());
                Transition(State::select_client())
            }
            RentalEvent::Back => {
                self.clear();
                Transition(State::home())
            }
            _ => Handled,
        }
    }

    #[state]
    fn select_client(&mut self, event: &RentalEvent) -> Outcome<State> {
        match event {
            RentalEvent::RentalCommitted { client_id } => {
                tracing::info!(
                    motorcycle.id = ?self.selected_motorcycle,
                    client.id = %client_id,
                    "Rental flow completed"
                );
                self.clear();
                Transition(State::home())
            }
            RentalEvent::Back => {
                self.clear();
                Transition(State::home())
            }
            _ => Handled,
        }
    }

    #[state]
    fn rental_details(&mut self, event: &RentalEvent) -> Outcome<State> {
        match event {
            RentalEvent::RentalReturned => {
                tracing::info!(motorcycle.id = ?self.opened_rental, "Return flow completed");
                self.clear();
                Transition(State::home())
            }
            RentalEvent::Back => {
                self.clear();
                Transition(State::home())
            }
            _ => Handled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picked(id: &str, available: bool) -> RentalEvent {
        RentalEvent::MotorcyclePicked {
            motorcycle_id: id.to_string(),
            available,
        }
    }

    #[test]
    fn test_rental_flow_round_trip() {
        let mut sm = RentalFlow::new().state_machine();
        assert_eq!(sm.state(), &State::home());

        sm.handle(&RentalEvent::NewRental);
        assert_eq!(sm.state(), &State::select_motorcycle());

        sm.handle(&picked("m1", true));
        assert_eq!(sm.state(), &State::select_client());
        assert_eq!(sm.inner().selected_motorcycle(), Some("m1"));

        sm.handle(&RentalEvent::RentalCommitted {
            client_id: "c1".to_string(),
        });
        assert_eq!(sm.state(), &State::home());
        assert_eq!(sm.inner().selected_motorcycle(), None);
    }

    #[test]
    fn test_unavailable_pick_keeps_state() {
        let mut sm = RentalFlow::new().state_machine();
        sm.handle(&RentalEvent::NewRental);
        sm.handle(&picked("m2", false));

        assert_eq!(sm.state(), &State::select_motorcycle());
        assert_eq!(sm.inner().selected_motorcycle(), None);
    }

    #[test]
    fn test_back_discards_selection() {
        let mut sm = RentalFlow::new().state_machine();
        sm.handle(&RentalEvent::NewRental);
        sm.handle(&picked("m1", true));
        sm.handle(&RentalEvent::Back);

        assert_eq!(sm.state(), &State::home());
        assert_eq!(sm.inner().selected_motorcycle(), None);
    }

    #[test]
    fn test_details_return_goes_home() {
        let mut sm = RentalFlow::new().state_machine();
        sm.handle(&RentalEvent::RentalOpened {
            motorcycle_id: "m2".to_string(),
        });
        assert_eq!(sm.state(), &State::rental_details());
        assert_eq!(sm.inner().opened_rental(), Some("m2"));

        sm.handle(&RentalEvent::RentalReturned);
        assert_eq!(sm.state(), &State::home());
        assert_eq!(sm.inner().opened_rental(), None);
    }

    #[test]
    fn test_events_out_of_place_are_ignored() {
        let mut sm = RentalFlow::new().state_machine();
        sm.handle(&RentalEvent::RentalReturned);
        sm.handle(&RentalEvent::Back);
        sm.handle(&picked("m1", true));
        assert_eq!(sm.state(), &State::home());
        assert_eq!(current_step(&sm), Step::Home);
    }
}

use anyhow::Result;
use fleet::{RentalWorkflow, Screen};

use super::FleetContext;
use crate::cli::RentalCommands;

pub struct RentalsCommand {
    command: RentalCommands,
}

impl RentalsCommand {
    pub fn new(command: RentalCommands) -> Self {
        Self { command }
    }

    pub async fn execute(self, ctx: &FleetContext) -> Result<()> {
        match self.command {
            RentalCommands::List => list(ctx).await,
            RentalCommands::Assign { motorcycle, client } => {
                // Walk the same screens the app does: home, select motorcycle, select client.
                let mut workflow = RentalWorkflow::new(ctx.rentals.clone());
                workflow.start_rental().await?;
                workflow.pick_motorcycle(&motorcycle).await?;
                let screen = workflow.pick_client(&client).await?;
                if screen != Screen::Home {
                    anyhow::bail!("Rental of {motorcycle} was interrupted");
                }
                println!("🔑 Motorcycle {motorcycle} rented to client {client}");
                Ok(())
            }
            RentalCommands::Return { motorcycle } => {
                let mut workflow = RentalWorkflow::new(ctx.rentals.clone());
                workflow.open_rental(&motorcycle).await?;
                workflow.return_rental().await?;
                println!("↩️  Motorcycle {motorcycle} returned");
                Ok(())
            }
        }
    }
}

async fn list(ctx: &FleetContext) -> Result<()> {
    let rentals = ctx.rentals.active_rentals().await?;
    if rentals.is_empty() {
        println!("📋 No active rentals");
        return Ok(());
    }
    for m in &rentals {
        let details = ctx.rentals.rental_details(&m.id).await?;
        let renter = match &details.client {
            Some(c) => format!("{} ({})", c.name, c.id),
            None => format!("{} (unknown client)", m.client.as_deref().unwrap_or("-")),
        };
        println!("{}  {} {}  →  {}", m.id, m.brand, m.name, renter);
    }
    Ok(())
}

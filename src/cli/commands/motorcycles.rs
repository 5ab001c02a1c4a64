use anyhow::{Context, Result};
use fleet::camera::AlwaysContinue;
use fleet::models::{Motorcycle, MotorcycleDraft, PictureField, RecordKind, RentalStatus};
use fleet::CancelScope;

use super::{or_dash, FleetContext};
use crate::cli::{MotorcycleCommands, MotorcycleEdits, MotorcycleFields};

pub struct MotorcyclesCommand {
    command: MotorcycleCommands,
}

impl MotorcyclesCommand {
    pub fn new(command: MotorcycleCommands) -> Self {
        Self { command }
    }

    pub async fn execute(self, ctx: &FleetContext) -> Result<()> {
        match self.command {
            MotorcycleCommands::List { available } => list(ctx, available).await,
            MotorcycleCommands::Show { id } => show(ctx, &id).await,
            MotorcycleCommands::Add(fields) => add(ctx, fields).await,
            MotorcycleCommands::Edit { id, fields } => edit(ctx, &id, fields).await,
            MotorcycleCommands::Delete { ids } => delete(ctx, &ids).await,
            MotorcycleCommands::Photo(args) => {
                let field = if args.documents {
                    PictureField::Documents
                } else {
                    PictureField::Primary
                };
                attach_photos(ctx, RecordKind::Motorcycle, &args.id, field).await
            }
            MotorcycleCommands::RemovePhoto(args) => {
                let field = if args.documents {
                    PictureField::Documents
                } else {
                    PictureField::Primary
                };
                let removed = ctx
                    .records
                    .remove_picture(RecordKind::Motorcycle, &args.id, field, args.index)
                    .await?;
                println!("🗑️  Removed {removed}");
                Ok(())
            }
        }
    }
}

async fn list(ctx: &FleetContext, available_only: bool) -> Result<()> {
    let motorcycles = if available_only {
        ctx.rentals.available_motorcycles().await?
    } else {
        ctx.records.list_motorcycles().await?
    };

    if motorcycles.is_empty() {
        println!("📋 No motorcycles found");
        return Ok(());
    }
    for m in &motorcycles {
        println!("{}", summary_line(m));
    }
    Ok(())
}

fn summary_line(m: &Motorcycle) -> String {
    let status = match m.rental_status() {
        RentalStatus::Available => "available".to_string(),
        RentalStatus::Rented { client_name, .. } => format!("rented to {client_name}"),
        RentalStatus::Inconsistent => "inconsistent".to_string(),
    };
    format!("{}  {} {} ({})  [{}]", m.id, m.brand, m.name, m.year, status)
}

async fn show(ctx: &FleetContext, id: &str) -> Result<()> {
    let Some(m) = ctx.records.get_motorcycle(id).await? else {
        anyhow::bail!("Motorcycle {id} not found");
    };
    println!("🏍️  {}", summary_line(&m));
    println!("   Type: {}", or_dash(&m.kind));
    println!("   Color: {}", or_dash(&m.color));
    println!("   Odometer: {} km", m.odometer);
    println!("   Pictures: {}", m.pictures.len());
    for (i, p) in m.pictures.iter().enumerate() {
        println!("     [{i}] {p}");
    }
    println!("   Documents: {}", m.document_pictures.len());
    for (i, p) in m.document_pictures.iter().enumerate() {
        println!("     [{i}] {p}");
    }
    Ok(())
}

async fn add(ctx: &FleetContext, fields: MotorcycleFields) -> Result<()> {
    let draft = MotorcycleDraft {
        name: fields.name,
        brand: fields.brand,
        year: fields.year,
        kind: fields.kind,
        color: fields.color,
        odometer: fields.odometer,
        ..Default::default()
    };
    let m = ctx.records.create_motorcycle(draft).await?;
    println!("✅ Motorcycle {} created", m.id);
    Ok(())
}

async fn edit(ctx: &FleetContext, id: &str, edits: MotorcycleEdits) -> Result<()> {
    let Some(current) = ctx.records.get_motorcycle(id).await? else {
        anyhow::bail!("Motorcycle {id} not found");
    };
    let mut draft = MotorcycleDraft::from(&current);
    if let Some(name) = edits.name {
        draft.name = name;
    }
    if let Some(brand) = edits.brand {
        draft.brand = brand;
    }
    if let Some(year) = edits.year {
        draft.year = year;
    }
    if let Some(kind) = edits.kind {
        draft.kind = kind;
    }
    if let Some(color) = edits.color {
        draft.color = color;
    }
    if let Some(odometer) = edits.odometer {
        draft.odometer = odometer;
    }
    ctx.records.update_motorcycle(id, draft).await?;
    println!("✅ Motorcycle {id} updated");
    Ok(())
}

async fn delete(ctx: &FleetContext, ids: &[String]) -> Result<()> {
    let mut failures = 0;
    for (id, outcome) in ctx.records.delete_motorcycles(ids).await {
        match outcome {
            Ok(report) if report.is_complete() => {
                println!("🗑️  Motorcycle {id} deleted ({} photos removed)", report.images_removed)
            }
            Ok(report) => println!(
                "⚠️  Motorcycle {id} deleted, {} photo(s) could not be removed",
                report.images_left.len()
            ),
            Err(e) => {
                failures += 1;
                println!("❌ Motorcycle {id}: {e}");
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} deletion(s) failed");
    }
    Ok(())
}

/// Capture every queued file into the record's picture list.
pub(crate) async fn attach_photos(
    ctx: &FleetContext,
    kind: RecordKind,
    id: &str,
    field: PictureField,
) -> Result<()> {
    let images = ctx.records.images();
    images
        .request_permission()
        .await
        .context("Camera permission is required to attach photos")?;

    let captured = images
        .capture_multiple(&AlwaysContinue(true), &CancelScope::new())
        .await?;
    let count = captured.len();
    if let Err(e) = ctx
        .records
        .attach_pictures(kind, id, field, captured.clone())
        .await
    {
        images.delete_images(&captured).await;
        return Err(e.into());
    }
    println!("📸 Attached {count} photo(s) to {} {id}", kind.label());
    Ok(())
}

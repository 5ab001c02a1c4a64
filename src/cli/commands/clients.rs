use anyhow::Result;
use fleet::models::{ClientDraft, PictureField, RecordKind};

use super::motorcycles::attach_photos;
use super::{or_dash, FleetContext};
use crate::cli::{ClientCommands, ClientEdits, ClientFields};

pub struct ClientsCommand {
    command: ClientCommands,
}

impl ClientsCommand {
    pub fn new(command: ClientCommands) -> Self {
        Self { command }
    }

    pub async fn execute(self, ctx: &FleetContext) -> Result<()> {
        match self.command {
            ClientCommands::List => {
                let clients = ctx.records.list_clients().await?;
                if clients.is_empty() {
                    println!("📋 No clients found");
                }
                for c in &clients {
                    println!("{}  {}  {}", c.id, c.name, or_dash(&c.phone));
                }
                Ok(())
            }
            ClientCommands::Show { id } => {
                let Some(c) = ctx.records.get_client(&id).await? else {
                    anyhow::bail!("Client {id} not found");
                };
                println!("👤 {}  {}", c.id, c.name);
                println!("   Address: {}", or_dash(&c.address));
                println!("   Phone: {}", or_dash(&c.phone));
                println!("   Call: {}", c.dial_uri());
                println!("   WhatsApp: {}", c.whatsapp_uri());
                match &c.picture {
                    Some(p) => println!("   Picture: {p}"),
                    None => println!("   Picture: -"),
                }
                println!("   Documents: {}", c.document_pictures.len());
                for (i, p) in c.document_pictures.iter().enumerate() {
                    println!("     [{i}] {p}");
                }
                Ok(())
            }
            ClientCommands::Add(fields) => add(ctx, fields).await,
            ClientCommands::Edit { id, fields } => edit(ctx, &id, fields).await,
            ClientCommands::Delete { id } => {
                let report = ctx.records.delete_client(&id).await?;
                if report.is_complete() {
                    println!("🗑️  Client {id} deleted ({} photos removed)", report.images_removed);
                } else {
                    println!(
                        "⚠️  Client {id} deleted, {} photo(s) could not be removed",
                        report.images_left.len()
                    );
                }
                Ok(())
            }
            ClientCommands::Photo(args) => {
                let field = if args.documents {
                    PictureField::Documents
                } else {
                    PictureField::Primary
                };
                attach_photos(ctx, RecordKind::Client, &args.id, field).await
            }
            ClientCommands::RemovePhoto(args) => {
                let field = if args.documents {
                    PictureField::Documents
                } else {
                    PictureField::Primary
                };
                let removed = ctx
                    .records
                    .remove_picture(RecordKind::Client, &args.id, field, args.index)
                    .await?;
                println!("🗑️  Removed {removed}");
                Ok(())
            }
        }
    }
}

async fn add(ctx: &FleetContext, fields: ClientFields) -> Result<()> {
    let draft = ClientDraft {
        name: fields.name,
        address: fields.address,
        phone: fields.phone,
        ..Default::default()
    };
    let c = ctx.records.create_client(draft).await?;
    println!("✅ Client {} created", c.id);
    Ok(())
}

async fn edit(ctx: &FleetContext, id: &str, edits: ClientEdits) -> Result<()> {
    let Some(current) = ctx.records.get_client(id).await? else {
        anyhow::bail!("Client {id} not found");
    };
    let mut draft = ClientDraft::from(&current);
    if let Some(name) = edits.name {
        draft.name = name;
    }
    if let Some(address) = edits.address {
        draft.address = address;
    }
    if let Some(phone) = edits.phone {
        draft.phone = phone;
    }
    ctx.records.update_client(id, draft).await?;
    println!("✅ Client {id} updated");
    Ok(())
}

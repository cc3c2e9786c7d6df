//! Command implementations. Each protected command checks the session
//! before touching the backend, the way a guarded screen would.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::warn;

use shopdesk_core::models::{ImageUpload, Order, OrderStatus, Product, ProductInput, RegisterRequest};
use shopdesk_core::utils::{format_date, format_money, format_optional, truncate_string};
use shopdesk_core::{ApiError, ApiGateway, Config, RouteAccess, SessionManager};

use crate::{OrderCommand, ProductCommand};

/// Environment variables for non-interactive login
const ENV_USERNAME: &str = "SHOPDESK_USERNAME";
const ENV_PASSWORD: &str = "SHOPDESK_PASSWORD";

/// Column width for product and customer names in tables
const NAME_WIDTH: usize = 28;

pub struct Output {
    pub json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}

fn require_login(session: &SessionManager) -> Result<()> {
    match session.route_access() {
        RouteAccess::Granted => Ok(()),
        RouteAccess::Pending => bail!("Session is still being checked"),
        RouteAccess::RedirectToLogin => bail!("Not logged in. Run `shopdesk login` first."),
    }
}

/// Replace a backend error with the reason the backend gave, when it gave
/// one. Anything else is left as it is.
pub fn user_facing(err: anyhow::Error) -> anyhow::Error {
    let detail = err
        .downcast_ref::<ApiError>()
        .and_then(ApiError::detail)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    match detail {
        Some(detail) => anyhow::anyhow!(detail),
        None => err,
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

// ===== Account =====

pub async fn login(
    session: &SessionManager,
    config: &mut Config,
    username: Option<String>,
) -> Result<()> {
    let username = match username
        .or_else(|| std::env::var(ENV_USERNAME).ok())
        .filter(|u| !u.is_empty())
    {
        Some(u) => u,
        None => match config.last_username.clone() {
            Some(last) => {
                let input = prompt(&format!("Username [{}]: ", last))?;
                if input.is_empty() {
                    last
                } else {
                    input
                }
            }
            None => prompt("Username: ")?,
        },
    };
    if username.is_empty() {
        bail!("Username is required");
    }

    let password = match std::env::var(ENV_PASSWORD) {
        Ok(p) if !p.is_empty() => p,
        _ => rpassword::prompt_password("Password: ")?,
    };

    match session.login(&username, &password).await {
        Ok(identity) => {
            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Logged in as {}", identity.display_name());
            Ok(())
        }
        Err(failure) => bail!("{}", failure.message),
    }
}

pub fn logout(session: &SessionManager) {
    session.logout();
    println!("Logged out");
}

pub async fn whoami(api: &ApiGateway, out: &Output) -> Result<()> {
    require_login(api.session())?;
    let identity = api.fetch_profile().await?;
    out.emit(&identity, || {
        println!("{}", identity.display_name());
        if let Some(id) = identity.id() {
            println!("  id:    {}", id);
        }
        if let Some(email) = identity.email() {
            println!("  email: {}", email);
        }
        if let Some(role) = identity.role() {
            println!("  role:  {}", role);
        }
    })
}

pub async fn register(
    api: &ApiGateway,
    out: &Output,
    username: String,
    email: String,
    full_name: Option<String>,
) -> Result<()> {
    let password = rpassword::prompt_password("New password: ")?;
    let confirm = rpassword::prompt_password("Repeat password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let request = RegisterRequest {
        username,
        email,
        password,
        full_name,
    };
    let created = api.register(&request).await?;
    out.emit(&created, || {
        println!("Account created for {}", created.display_name());
    })
}

// ===== Dashboard =====

pub async fn dashboard(api: &ApiGateway, out: &Output) -> Result<()> {
    require_login(api.session())?;
    let summary = api.fetch_dashboard().await?;
    out.emit(&summary, || {
        println!("Products: {}", summary.total_products);
        println!("Orders:   {}", summary.total_orders);
        println!("Revenue:  {}", format_money(summary.total_revenue));
        println!();
        if summary.recent_orders.is_empty() {
            println!("No orders yet");
            return;
        }
        println!("Recent orders");
        for order in &summary.recent_orders {
            println!(
                "  {:<20} {:<30} {:>10}  {:<10} {}",
                order.order_number,
                order.customer,
                format_money(order.total),
                order.status.label(),
                order.created_at.as_deref().map(format_date).unwrap_or_default(),
            );
        }
    })
}

// ===== Products =====

fn print_product_row(product: &Product) {
    println!(
        "{:>5}  {:<width$} {:>10} {:>6}  {:<12} {}",
        product.id,
        truncate_string(&product.name, NAME_WIDTH),
        format_money(product.price),
        product.stock_quantity,
        truncate_string(&format_optional(&product.category, "-"), 12),
        stock_note(product),
        width = NAME_WIDTH,
    );
}

fn stock_note(product: &Product) -> &'static str {
    match (product.is_active, product.is_in_stock()) {
        (false, _) => "(inactive)",
        (true, false) => "(out of stock)",
        (true, true) => "",
    }
}

fn print_product(product: &Product) {
    println!("#{} {}", product.id, product.name);
    println!("  price:       {}", format_money(product.price));
    println!("  stock:       {}", product.stock_quantity);
    println!("  category:    {}", format_optional(&product.category, "-"));
    println!("  active:      {}", if product.is_active { "yes" } else { "no" });
    println!("  image:       {}", format_optional(&product.image_url, "-"));
    println!("  description: {}", format_optional(&product.description, "-"));
}

pub async fn products(api: &ApiGateway, out: &Output, cmd: ProductCommand) -> Result<()> {
    require_login(api.session())?;
    match cmd {
        ProductCommand::List => {
            let products = api.list_products().await?;
            out.emit(&products, || {
                if products.is_empty() {
                    println!("No products");
                }
                for product in &products {
                    print_product_row(product);
                }
            })
        }
        ProductCommand::Show { id } => {
            let product = api.get_product(id).await?;
            out.emit(&product, || print_product(&product))
        }
        ProductCommand::Create {
            name,
            price,
            stock,
            description,
            category,
            inactive,
        } => {
            let input = ProductInput {
                name,
                description,
                price,
                stock_quantity: stock,
                category,
                is_active: !inactive,
            };
            let created = api.create_product(&input).await?;
            out.emit(&created, || println!("Created product #{}", created.id))
        }
        ProductCommand::Update {
            id,
            name,
            price,
            stock,
            description,
            category,
            active,
        } => {
            let mut input = api.get_product(id).await?.to_input();
            if let Some(name) = name {
                input.name = name;
            }
            if let Some(price) = price {
                input.price = price;
            }
            if let Some(stock) = stock {
                input.stock_quantity = stock;
            }
            if let Some(description) = description {
                input.description = description;
            }
            if let Some(category) = category {
                input.category = category;
            }
            if let Some(active) = active {
                input.is_active = active;
            }
            let updated = api.update_product(id, &input).await?;
            out.emit(&updated, || println!("Updated product #{}", updated.id))
        }
        ProductCommand::Delete { id, yes } => {
            if !yes {
                let answer = prompt(&format!("Delete product #{}? [y/N]: ", id))?;
                if !answer.eq_ignore_ascii_case("y") {
                    println!("Cancelled");
                    return Ok(());
                }
            }
            api.delete_product(id).await?;
            println!("Deleted product #{}", id);
            Ok(())
        }
        ProductCommand::UploadImage { id, path } => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let content_type = ImageUpload::content_type_for(&file_name)
                .unwrap_or("application/octet-stream");
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let image = ImageUpload::new(file_name, content_type, bytes)?;

            match api.upload_product_image(id, &image).await? {
                Some(product) => out.emit(&product, || {
                    println!(
                        "Image attached to #{}: {}",
                        product.id,
                        format_optional(&product.image_url, "-")
                    )
                }),
                None => {
                    println!("Image uploaded for product #{}", id);
                    Ok(())
                }
            }
        }
    }
}

// ===== Orders =====

fn print_order_row(order: &Order) {
    println!(
        "{:>5}  {:<20} {:<width$} {:>10}  {:<10} {}",
        order.id,
        order.display_number(),
        truncate_string(order.customer_line().unwrap_or("-"), NAME_WIDTH),
        format_money(order.total_amount),
        order.status.label(),
        order.created_at.as_deref().map(format_date).unwrap_or_default(),
        width = NAME_WIDTH,
    );
}

fn print_order(order: &Order) {
    println!("Order {} ({})", order.display_number(), order.status.label());
    println!("  total:    {}", format_money(order.total_amount));
    println!("  payment:  {}", format_optional(&order.payment_status, "-"));
    println!("  phone:    {}", format_optional(&order.phone_number, "-"));
    if let Some(ref created) = order.created_at {
        println!("  placed:   {}", format_date(created));
    }
    if let Some(ref address) = order.shipping_address {
        println!("  ship to:");
        for line in address.lines() {
            println!("    {}", line);
        }
    }
    if let Some(ref notes) = order.notes {
        println!("  notes:    {}", notes);
    }
    println!("  items ({}):", order.item_count());
    for item in &order.order_items {
        println!(
            "    {:>3} x {:<width$} {:>10} {:>10}",
            item.quantity,
            truncate_string(&item.product_name(), NAME_WIDTH),
            format_money(item.unit_price),
            format_money(item.total_price),
            width = NAME_WIDTH,
        );
    }
}

fn parse_status(s: &str) -> Result<OrderStatus> {
    OrderStatus::parse(s).ok_or_else(|| {
        let valid: Vec<&str> = OrderStatus::ASSIGNABLE.iter().map(|s| s.as_str()).collect();
        anyhow::anyhow!("Unknown status '{}'. Expected one of: {}", s, valid.join(", "))
    })
}

pub async fn orders(api: &ApiGateway, out: &Output, cmd: OrderCommand) -> Result<()> {
    require_login(api.session())?;
    match cmd {
        OrderCommand::List { status } => {
            let filter = status.as_deref().map(parse_status).transpose()?;
            let orders: Vec<Order> = api
                .list_orders()
                .await?
                .into_iter()
                .filter(|o| filter.map_or(true, |f| o.status == f))
                .collect();
            out.emit(&orders, || {
                if orders.is_empty() {
                    println!("No orders");
                }
                for order in &orders {
                    print_order_row(order);
                }
            })
        }
        OrderCommand::Show { id } => {
            let order = api.get_order(id).await?;
            out.emit(&order, || print_order(&order))
        }
        OrderCommand::SetStatus { id, status } => {
            let status = parse_status(&status)?;
            let order = api.update_order_status(id, status).await?;
            out.emit(&order, || {
                println!("Order {} is now {}", order.display_number(), order.status)
            })
        }
    }
}

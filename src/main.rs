use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flexspace::api::ApiClient;
use flexspace::auth::{AuthContext, AuthUser, ProfileStore};
use flexspace::config::Config;
use flexspace::listings::{AdminData, AdminQuery, AdminTab, ListingFilters, ListingQuery};
use flexspace::models::{ListingType, Property, PropertyKind, UserRole, VendorCategory};
use flexspace::submit::{submit_property, ListingForm};
use flexspace::upload::{ImageFile, UploadCoordinator};

#[derive(Parser)]
#[command(name = "flexspace", about = "Browse and manage flex space listings")]
struct Cli {
    /// Backend base URL (overrides FLEXSPACE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// ID token for authenticated commands (overrides FLEXSPACE_ID_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Print results as pretty JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Tab {
    Vendors,
    Properties,
    Blogs,
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Buyer,
    Seller,
}

#[derive(Subcommand)]
enum Command {
    /// Browse public listings
    Listings {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// sale or lease
        #[arg(long)]
        listing_type: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one listing
    Show { id: String },
    /// Recently added listings
    Recent,
    /// Vendor directory
    Vendors {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        verified_only: bool,
    },
    /// Industry insights articles
    Blogs {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one article
    Blog { id: String },
    /// Cache the marketplace profile for a signed-in user
    Profile {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum, default_value_t = Role::Buyer)]
        role: Role,
    },
    /// Upload images and print their URLs
    Upload { files: Vec<PathBuf> },
    /// Submit a listing as the cached seller profile
    Submit {
        #[arg(long)]
        title: String,
        #[arg(long)]
        location: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        acreage: Option<f64>,
        #[arg(long)]
        units: Option<u32>,
        #[arg(long)]
        lease: bool,
        #[arg(long)]
        traditional_site: bool,
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        #[arg(long)]
        skip_images: bool,
    },
    /// Check whether the token belongs to an admin
    AdminCheck,
    /// Admin dashboard tab
    Admin {
        #[arg(long, value_enum, default_value_t = Tab::Vendors)]
        tab: Tab,
        #[arg(long)]
        include_inactive: bool,
        #[arg(long)]
        include_unpublished: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Soft-deactivate one of your listings
    Delist { id: String },
    /// Reactivate one of your listings
    Relist { id: String },
}

fn emit<T: Serialize>(json: bool, value: &T, render: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        render(value);
    }
    Ok(())
}

fn print_property(i: usize, property: &Property) {
    println!("{}. {} (${:.0})", i + 1, property.title, property.price);
    println!("   {} · For {}", property.location, property.listing_type);
    if let Some(acreage) = property.acreage {
        println!("   {} acres", acreage);
    }
    if let Some(units) = property.unit_count {
        println!("   {} units", units);
    }
    if !property.active {
        println!("   (delisted)");
    }
    println!("   ID: {}", property.id);
    println!();
}

fn require_token(config: &Config) -> Result<String> {
    config
        .id_token
        .clone()
        .context("This command needs an ID token (--token or FLEXSPACE_ID_TOKEN)")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    if let Some(token) = cli.token {
        config.id_token = Some(token);
    }

    let api = ApiClient::new(&config)?;
    info!("Using backend at {}", api.base_url());

    match cli.command {
        Command::Listings {
            search,
            location,
            listing_type,
            page,
        } => {
            let listing_type = match listing_type {
                Some(raw) => Some(ListingType::parse(&raw).with_context(|| format!("Unknown listing type: {raw}"))?),
                None => None,
            };
            let mut query = ListingQuery::new(ListingFilters {
                listing_type,
                location: location.unwrap_or_default(),
                search: search.unwrap_or_default(),
            });
            query.set_page(page);

            let visible: Vec<Property> = query.fetch(&api).await.into_iter().cloned().collect();
            emit(cli.json, &visible, |properties| {
                for (i, property) in properties.iter().enumerate() {
                    print_property(i, property);
                }
                println!(
                    "Showing {} properties, page {} of {}",
                    properties.len(),
                    query.page(),
                    query.total_pages()
                );
            })?;
        }
        Command::Show { id } => {
            let property = api.property(&id).await.with_context(|| format!("Property {id} not found"))?;
            emit(cli.json, &property, |p| {
                print_property(0, p);
                if let Some(description) = &p.description {
                    println!("{}", description);
                }
                if let Some(realtor) = &p.realtor {
                    println!(
                        "Contact: {} {} {}",
                        realtor.contact_name.as_deref().unwrap_or(""),
                        realtor.contact_email.as_deref().unwrap_or(""),
                        realtor.contact_phone.as_deref().unwrap_or("")
                    );
                }
            })?;
        }
        Command::Recent => {
            let properties = api.recently_added().await;
            emit(cli.json, &properties, |properties| {
                for (i, property) in properties.iter().enumerate() {
                    print_property(i, property);
                }
            })?;
        }
        Command::Vendors {
            category,
            verified_only,
        } => {
            let category = category.as_deref().map(VendorCategory::from);
            let vendors = api.vendors(category.as_ref(), verified_only).await;
            emit(cli.json, &vendors, |vendors| {
                for (i, vendor) in vendors.iter().enumerate() {
                    let badge = if vendor.verified { " ✓" } else { "" };
                    println!("{}. {}{} [{}]", i + 1, vendor.company_name, badge, vendor.category);
                    println!("   {}", vendor.services);
                }
            })?;
        }
        Command::Blogs { category, page } => {
            let blogs = api.blogs(category.as_deref(), page).await;
            emit(cli.json, &blogs, |blogs| {
                for (i, blog) in blogs.items.iter().enumerate() {
                    println!("{}. {} by {} ({} views)", i + 1, blog.title, blog.author, blog.views);
                    println!("   {}", blog.excerpt);
                }
                println!("Page {} of {}", blogs.current_page, blogs.pages);
            })?;
        }
        Command::Blog { id } => {
            let blog = api.blog(&id).await.with_context(|| format!("Blog {id} not found"))?;
            emit(cli.json, &blog, |blog| {
                println!("{}\n", blog.title);
                println!("{}", blog.content);
            })?;
        }
        Command::Profile {
            uid,
            email,
            name,
            role,
        } => {
            let token = config.id_token.clone().unwrap_or_default();
            let mut auth = AuthContext::new(ProfileStore::new(&config.profile_path));
            let role = match role {
                Role::Buyer => UserRole::Buyer,
                Role::Seller => UserRole::Seller,
            };
            let user = AuthUser {
                uid,
                email,
                display_name: None,
                id_token: token,
            };
            auth.sign_up(user, role, name).await?;
            info!("💾 Saved profile to {}", config.profile_path.display());
        }
        Command::Upload { files } => {
            let token = require_token(&config)?;
            let mut images = Vec::with_capacity(files.len());
            for path in &files {
                images.push(ImageFile::from_path(path).await?);
            }

            let uploads = UploadCoordinator::from_config(&api, &config);
            let outcome = uploads.upload(&images, &token).await;
            if let Some(banner) = outcome.banner() {
                warn!("{}", banner);
            }
            emit(cli.json, &outcome.urls, |urls| {
                for url in urls {
                    println!("{}", url);
                }
            })?;
        }
        Command::Submit {
            title,
            location,
            description,
            price,
            acreage,
            units,
            lease,
            traditional_site,
            images,
            skip_images,
        } => {
            let token = require_token(&config)?;
            let mut auth = AuthContext::new(ProfileStore::new(&config.profile_path));
            auth.restore().await;
            let Some(profile) = auth.profile().cloned() else {
                bail!("No cached profile; run `flexspace profile --role seller` first");
            };
            let user = AuthUser {
                uid: profile.uid,
                email: profile.email.clone(),
                display_name: profile.display_name,
                id_token: token,
            };
            auth.on_auth_state_changed(Some(user), &api).await?;

            let mut files = Vec::with_capacity(images.len());
            for path in &images {
                files.push(ImageFile::from_path(path).await?);
            }

            let form = ListingForm {
                title,
                location,
                description,
                price,
                acreage,
                unit_count: units,
                kind: if traditional_site {
                    PropertyKind::TraditionalSite
                } else {
                    PropertyKind::Other
                },
                listing_type: if lease { ListingType::Lease } else { ListingType::Sale },
                contact_name: None,
                contact_email: profile.email,
                contact_phone: None,
            };

            let uploads = UploadCoordinator::from_config(&api, &config);
            let report = submit_property(&api, &uploads, &auth, form, &files, skip_images).await?;
            if let Some(banner) = report.upload.banner() {
                println!("{}", banner);
            }
            println!("✅ {}", report.created.message);
        }
        Command::AdminCheck => {
            let token = require_token(&config)?;
            let check = api.check_admin(&token).await?;
            println!("is_admin: {}", check.is_admin);
        }
        Command::Admin {
            tab,
            include_inactive,
            include_unpublished,
            page,
        } => {
            let token = require_token(&config)?;
            let mut query = AdminQuery::default();
            query.select_tab(match tab {
                Tab::Vendors => AdminTab::Vendors,
                Tab::Properties => AdminTab::Properties,
                Tab::Blogs => AdminTab::Blogs,
            });
            query.set_include_inactive(include_inactive);
            query.set_include_unpublished(include_unpublished);
            query.set_page(page);

            match query.fetch(&api, &token).await? {
                AdminData::Vendors(vendors) => emit(cli.json, &vendors, |vendors| {
                    for vendor in vendors {
                        println!("{} {} active={}", vendor.id, vendor.company_name, vendor.active);
                    }
                })?,
                AdminData::Properties(properties) => emit(cli.json, &properties, |properties| {
                    for (i, property) in properties.iter().enumerate() {
                        print_property(i, property);
                    }
                })?,
                AdminData::Blogs(blogs) => emit(cli.json, &blogs, |blogs| {
                    for blog in blogs {
                        println!("{} {} published={}", blog.id, blog.title, blog.published);
                    }
                })?,
            }
        }
        Command::Delist { id } => {
            let token = require_token(&config)?;
            api.delist_property(&id, &token).await?;
            println!("Property {id} delisted");
        }
        Command::Relist { id } => {
            let token = require_token(&config)?;
            api.relist_property(&id, &token).await?;
            println!("Property {id} relisted");
        }
    }

    Ok(())
}

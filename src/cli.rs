use std::{collections::BTreeSet, path::PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use ebook_portal::{
    PortalApi,
    config::Config,
    domain::{
        BlogQuery, DownloadQuery, EbookQuery, EbookStatus, LeadForm, LeadType, Paginated,
        Pagination, SendEbookRequest,
    },
    download::DownloadFlow,
    file_manager::FileManager,
    session::AuthState,
};

#[derive(Debug, Parser)]
#[command(name = "ebook_portal", version, about = "Ebook portal client and admin console")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in as an admin or author
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Public ebook catalog
    #[command(subcommand)]
    Ebooks(EbookCommand),
    /// Public blog
    #[command(subcommand)]
    Blogs(BlogCommand),
    /// Admin console (requires an admin or author session)
    #[command(subcommand)]
    Admin(AdminCommand),
}

impl Command {
    /// Route reported to the navigator while the command runs.
    pub fn route(&self) -> &'static str {
        match self {
            Command::Login { .. } => "/login",
            Command::Admin(AdminCommand::Ebooks(_)) => "/admin/ebooks",
            Command::Admin(AdminCommand::Downloads(_)) => "/admin/downloads",
            Command::Admin(AdminCommand::Files(_)) => "/admin/files",
            Command::Admin(AdminCommand::Blogs(_)) => "/admin/blogs",
            _ => "/",
        }
    }
}

#[derive(Debug, Args)]
pub struct PageArgs {
    #[arg(long)]
    page: Option<u64>,
    #[arg(long)]
    limit: Option<u64>,
    #[arg(long)]
    search: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum EbookCommand {
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
    Show {
        slug: String,
    },
    Categories,
    /// Fill in the lead form and save the PDF
    Download {
        slug: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
        /// Target directory (defaults to PORTAL_DOWNLOAD_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum BlogCommand {
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        tag: Option<String>,
    },
    Show {
        slug: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    #[command(subcommand)]
    Ebooks(AdminEbookCommand),
    #[command(subcommand)]
    Downloads(AdminDownloadCommand),
    #[command(subcommand)]
    Files(AdminFileCommand),
    #[command(subcommand)]
    Blogs(AdminBlogCommand),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Active,
    Inactive,
}

impl From<StatusArg> for EbookStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Active => EbookStatus::Active,
            StatusArg::Inactive => EbookStatus::Inactive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LeadTypeArg {
    User,
    Admin,
}

impl From<LeadTypeArg> for LeadType {
    fn from(value: LeadTypeArg) -> Self {
        match value {
            LeadTypeArg::User => LeadType::User,
            LeadTypeArg::Admin => LeadType::Admin,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum AdminEbookCommand {
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    Delete {
        id: String,
    },
    Status {
        id: String,
        #[arg(value_enum)]
        status: StatusArg,
    },
    /// Email an ebook to someone and record an admin lead
    Send {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminDownloadCommand {
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        ebook: Option<String>,
        #[arg(long = "type", value_enum)]
        kind: Option<LeadTypeArg>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    Stats {
        #[arg(long)]
        days: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminFileCommand {
    List {
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    Upload {
        path: PathBuf,
        #[arg(long, default_value = "uploads")]
        folder: String,
    },
    /// Delete the given URLs in one batch
    Delete {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminBlogCommand {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Delete {
        id: String,
    },
}

fn print_page_footer(p: &Pagination) {
    println!("-- page {}/{} ({} total)", p.page, p.pages, p.total);
}

fn print_ebooks(list: &Paginated<ebook_portal::domain::Ebook>) {
    for e in &list.items {
        println!(
            "{:<26} {:<40} {:<10} downloads={} views={}",
            e.slug,
            e.name,
            e.status.as_str(),
            e.download_count,
            e.view_count
        );
    }
    print_page_footer(&list.pagination);
}

pub async fn run(command: Command, api: &PortalApi, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let response = api.auth().login(&email, &password).await?;
            if !response.user.can_use_console() {
                println!("Signed in, but this account cannot use the admin console");
            } else {
                println!("Signed in as {}", response.user.email.as_deref().unwrap_or(&email));
            }
        }
        Command::Logout => {
            api.auth().logout().await?;
            println!("Signed out");
        }
        Command::Whoami => match api.session().auth_state().await? {
            AuthState::Authenticated(user) => println!(
                "{} <{}> role={}",
                user.name.as_deref().unwrap_or("-"),
                user.email.as_deref().unwrap_or("-"),
                user.role.map(String::from).unwrap_or_default()
            ),
            AuthState::Unauthenticated => println!("Not signed in"),
        },
        Command::Ebooks(cmd) => run_ebooks(cmd, api, config).await?,
        Command::Blogs(cmd) => run_blogs(cmd, api).await?,
        Command::Admin(cmd) => {
            if !api.session().is_authenticated().await? {
                anyhow::bail!("Admin commands need an admin or author session, run `ebook_portal login` first");
            }
            run_admin(cmd, api).await?
        }
    }
    Ok(())
}

async fn run_ebooks(cmd: EbookCommand, api: &PortalApi, config: &Config) -> anyhow::Result<()> {
    let ebooks = api.ebooks();
    match cmd {
        EbookCommand::List {
            page,
            category,
            tag,
        } => {
            let query = EbookQuery {
                page: page.page,
                limit: page.limit,
                category,
                search: page.search,
                tag,
                status: None,
            };
            print_ebooks(&ebooks.list(&query).await?);
        }
        EbookCommand::Show { slug } => {
            let e = ebooks.get_by_slug(&slug).await?;
            println!("{}\n", e.name);
            if let Some(author) = &e.author {
                println!("Author:   {author}");
            }
            if let Some(category) = &e.category {
                println!("Category: {category}");
            }
            if let Some(pages) = e.page_count {
                println!("Pages:    {pages}");
            }
            if !e.tags.is_empty() {
                println!("Tags:     {}", e.tags.join(", "));
            }
            if let Some(description) = &e.description {
                println!("\n{description}");
            }
        }
        EbookCommand::Categories => {
            for c in ebooks.categories().await? {
                println!("{c}");
            }
        }
        EbookCommand::Download {
            slug,
            name,
            email,
            mobile,
            out,
        } => {
            let flow = DownloadFlow::new(ebooks, api.public_service().clone());
            let dest = out.unwrap_or_else(|| config.download_dir.clone());
            let path = flow
                .run(&slug, &LeadForm { name, email, mobile }, &dest)
                .await?;
            println!("Saved {}", path.display());
        }
    }
    Ok(())
}

async fn run_blogs(cmd: BlogCommand, api: &PortalApi) -> anyhow::Result<()> {
    let blogs = api.blogs();
    match cmd {
        BlogCommand::List { page, tag } => {
            let query = BlogQuery {
                page: page.page,
                limit: page.limit,
                tag,
                search: page.search,
                status: None,
            };
            let list = blogs.list(&query).await?;
            for p in &list.items {
                println!("{:<40} {}", p.slug, p.title);
            }
            print_page_footer(&list.pagination);
        }
        BlogCommand::Show { slug } => {
            let p = blogs.get_by_slug(&slug).await?;
            println!("{}\n", p.title);
            if let Some(content) = p.content.as_deref().or(p.excerpt.as_deref()) {
                println!("{content}");
            }
        }
    }
    Ok(())
}

async fn run_admin(cmd: AdminCommand, api: &PortalApi) -> anyhow::Result<()> {
    match cmd {
        AdminCommand::Ebooks(cmd) => {
            let ebooks = api.admin_ebooks();
            match cmd {
                AdminEbookCommand::List { page, status } => {
                    let query = EbookQuery {
                        page: page.page,
                        limit: page.limit,
                        search: page.search,
                        status: status.map(Into::into),
                        ..Default::default()
                    };
                    print_ebooks(&ebooks.list(&query).await?);
                }
                AdminEbookCommand::Delete { id } => {
                    ebooks.delete(&id).await?;
                    println!("Deleted ebook {id}");
                }
                AdminEbookCommand::Status { id, status } => {
                    let e = ebooks.set_status(&id, status.into()).await?;
                    println!("{} is now {}", e.name, e.status.as_str());
                }
                AdminEbookCommand::Send {
                    id,
                    name,
                    email,
                    mobile,
                } => {
                    let lead = ebooks
                        .send(&id, &SendEbookRequest { name, email, mobile })
                        .await?;
                    println!(
                        "Sent to {} (email sent: {})",
                        lead.email, lead.email_sent
                    );
                }
            }
        }
        AdminCommand::Downloads(cmd) => {
            let downloads = api.admin_downloads();
            match cmd {
                AdminDownloadCommand::List {
                    page,
                    ebook,
                    kind,
                    from,
                    to,
                } => {
                    let query = DownloadQuery {
                        page: page.page,
                        limit: page.limit,
                        ebook_id: ebook,
                        kind: kind.map(Into::into),
                        search: page.search,
                        from,
                        to,
                    };
                    let list = downloads.list(&query).await?;
                    for l in &list.items {
                        println!(
                            "{:<25} {:<30} {:<6} {:<30} {}",
                            l.name,
                            l.email,
                            l.kind.as_str(),
                            l.ebook
                                .as_ref()
                                .map(|e| e.name().unwrap_or(e.id()))
                                .unwrap_or("-"),
                            l.downloaded_at
                                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                                .unwrap_or_default()
                        );
                    }
                    print_page_footer(&list.pagination);
                }
                AdminDownloadCommand::Stats { days } => {
                    let s = downloads.stats(days).await?;
                    println!("Ebooks:    {} ({} active)", s.total_ebooks, s.active_ebooks);
                    println!("Downloads: {}", s.total_downloads);
                    println!("Leads:     {}", s.total_leads);
                    println!("Views:     {}", s.total_views);
                    if !s.top_ebooks.is_empty() {
                        println!("\nTop ebooks:");
                        for (i, t) in s.top_ebooks.iter().enumerate() {
                            println!("{:>3}. {:<40} {}", i + 1, t.name, t.download_count);
                        }
                    }
                    for point in &s.downloads_over_time {
                        println!("{} {}", point.date, point.count);
                    }
                }
            }
        }
        AdminCommand::Files(cmd) => run_files(cmd, api).await?,
        AdminCommand::Blogs(cmd) => {
            let blogs = api.admin_blogs();
            match cmd {
                AdminBlogCommand::List { page } => {
                    let query = BlogQuery {
                        page: page.page,
                        limit: page.limit,
                        search: page.search,
                        ..Default::default()
                    };
                    let list = blogs.list(&query).await?;
                    for p in &list.items {
                        println!("{:<26} {:<40} {:?}", p.id, p.title, p.status);
                    }
                    print_page_footer(&list.pagination);
                }
                AdminBlogCommand::Delete { id } => {
                    blogs.delete(&id).await?;
                    println!("Deleted post {id}");
                }
            }
        }
    }
    Ok(())
}

async fn run_files(cmd: AdminFileCommand, api: &PortalApi) -> anyhow::Result<()> {
    let mut manager = FileManager::new(api.admin_files());
    match cmd {
        AdminFileCommand::List { folder, search } => {
            manager.refresh().await?;
            manager.set_folder(folder);
            manager.set_search(search.unwrap_or_default());
            for f in manager.visible() {
                println!("{:>10}  {}  {}", f.size, f.path, f.url);
            }
        }
        AdminFileCommand::Upload { path, folder } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .context("Upload path has no file name")?
                .to_string();
            let item = api
                .admin_files()
                .upload(&folder, &file_name, bytes.into(), |fraction| {
                    eprint!("\rUploading {:>3.0}%", fraction * 100.0);
                })
                .await?;
            eprintln!();
            println!("Uploaded {}", item.url);
        }
        AdminFileCommand::Delete { urls } => {
            let urls: BTreeSet<String> = urls.into_iter().collect();
            manager.refresh().await?;
            for url in &urls {
                if !manager.toggle(url) {
                    anyhow::bail!("{url} is not in the file listing");
                }
            }
            manager.delete_selected().await?;
            println!("Deleted {} file(s)", urls.len());
        }
    }
    Ok(())
}

use clap::Args as ClapArgs;
use colored::Colorize;
use roster_lib::{Query, Repository, SortColumn, SortDirection, query::SortState};
use sysexits::ExitCode;

#[derive(ClapArgs, Debug, Clone)]
pub struct Args {
    /// Only show records whose name contains this text
    #[arg(short, long)]
    search: Option<String>,
    /// Column to sort by
    #[arg(long)]
    sort: Option<SortColumn>,
    /// Sort descending instead of ascending
    #[arg(long, requires = "sort")]
    desc: bool,
    /// Page to show, starting at 1
    #[arg(short, long, default_value_t = 1)]
    page: usize,
}

pub fn handle(repo: &Repository, args: &Args) -> ExitCode {
    let mut query = Query::default();

    if let Some(search) = &args.search {
        query.set_search(search.as_str());
    }

    if let Some(column) = args.sort {
        let direction = if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        query.set_sort(SortState::by(column, direction));
    }

    query.set_page(args.page);

    let page = repo.page(&query);

    if page.is_empty() {
        println!("No records found.");
    } else {
        println!(
            "{}",
            format!(
                "{:>4}  {:<20} {:<28} {:<12} {:<10} {:<12} {:<12} {:<14} {:<12} {}",
                "ID", "Name", "Email", "Phone", "DOB", "City", "District", "Province", "Country",
                "Image"
            )
            .bold()
        );

        for row in page.rows() {
            let record = &row.record;
            println!(
                "{:>4}  {:<20} {:<28} {:<12} {:<10} {:<12} {:<12} {:<14} {:<12} {}",
                record.id(),
                record.name,
                record.email,
                record.phone,
                record.date_of_birth.to_string(),
                record.city,
                record.district,
                record.province.map(|p| p.to_string()).unwrap_or_default(),
                record.country,
                if record.image.is_some() { "yes" } else { "-" }
            );
        }
    }

    println!("{}", page.indicator().dimmed());

    ExitCode::Ok
}

use anyhow::Context;

use notebook_tools::names::{load_lookups, normalize_name};

use crate::cli::LookupArgs;

pub fn run_lookup(args: LookupArgs) -> anyhow::Result<()> {
    let lookups = load_lookups(&args.authors, &args.works).context("Failed to build lookups")?;
    println!(
        "{} author variants, {} titles",
        lookups.name_to_author.len(),
        lookups.title_to_work.len()
    );

    for name in &args.names {
        match lookups.match_author(name) {
            Some(record) => println!(
                "name  {:?} [{}] -> {} ({})",
                name,
                normalize_name(name),
                record.authorized_name,
                record.author_id
            ),
            None => println!("name  {:?} [{}] -> no match", name, normalize_name(name)),
        }
    }

    for title in &args.titles {
        match lookups.match_title(title) {
            Some(record) => println!(
                "title {:?} -> work {} by {}",
                title, record.work_id, record.author_id
            ),
            None => println!("title {:?} -> no match", title),
        }
    }

    Ok(())
}

//! List built content

use anyhow::Result;

use crate::index::{sort_by_date, PostIndex, SortOrder, TagQuery};
use crate::Site;

/// Print the posts of a collection, optionally filtered by tags
pub fn run(site: &Site, collection: &str, tags: &[String], sort: SortOrder) -> Result<()> {
    let index = load(site, collection)?;

    let query = TagQuery::new(&index, tags.iter().cloned());
    if query.has_unknown() {
        let unknown: Vec<_> = tags.iter().filter(|t| !index.has_tag(t)).collect();
        tracing::warn!("Ignoring unknown tags: {:?}", unknown);
    }

    let posts = sort_by_date(query.apply(&index), sort);
    println!("{} ({}):", collection, posts.len());
    for post in posts {
        println!(
            "  {} - {} [{} min] {}",
            post.date.format("%Y-%m-%d"),
            post.title,
            post.minutes_to_read,
            post.href
        );
    }

    Ok(())
}

/// Print the tags of a collection with their post counts
pub fn run_tags(site: &Site, collection: &str) -> Result<()> {
    let index = load(site, collection)?;
    let counts = index.tag_counts();

    println!("Tags ({}):", counts.len());
    for (tag, count) in counts {
        println!("  {} ({})", tag, count);
    }

    Ok(())
}

fn load(site: &Site, collection: &str) -> Result<PostIndex> {
    let collection = site.collection(collection)?;
    Ok(PostIndex::load(site.artifact_dir(collection))?)
}

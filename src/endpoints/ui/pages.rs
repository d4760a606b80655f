use askama::Template;

use crate::content::{Family, GalleryLayout, GalleryPosition, Shuttle, WeddingContent};
use crate::edge_color::EdgeColors;
use crate::venue::{MapSettings, NavigationLinks, map_settings, navigation_links};

/// One half of the couple, as the invitation section shows it.
pub struct CoupleCard {
    pub name: String,
    /// "Groom's father · Groom's mother", empty without parents.
    pub parents: String,
    pub relation: String,
    pub role: &'static str,
}

impl CoupleCard {
    fn new(family: &Family, role: &'static str) -> Self {
        Self {
            name: family.name.clone(),
            parents: family.parents_text(),
            relation: family.relation_label().to_string(),
            role,
        }
    }
}

pub struct ShuttleCard<'a> {
    pub side: &'static str,
    pub shuttle: &'a Shuttle,
}

#[derive(Template)]
#[template(path = "index.html.j2", ext = "html")]
pub struct IndexPage<'a> {
    pub content: &'a WeddingContent,
    pub hero_image: String,
    pub edge_colors: Option<EdgeColors>,
    pub couple: Vec<CoupleCard>,
    pub shuttles: Vec<ShuttleCard<'a>>,
    pub gallery_images: Vec<String>,
    pub gallery_middle: bool,
    pub gallery_grid: bool,
    pub links: NavigationLinks,
    pub map: Option<MapSettings>,
    pub guest_options: Vec<(u32, String)>,
}

impl<'a> IndexPage<'a> {
    pub fn new(
        content: &'a WeddingContent,
        hero_image: String,
        edge_colors: Option<EdgeColors>,
        gallery_images: Vec<String>,
    ) -> Self {
        let couple = vec![
            CoupleCard::new(&content.invitation.groom, "Groom"),
            CoupleCard::new(&content.invitation.bride, "Bride"),
        ];

        let shuttles = [
            ("Groom's side", content.venue.groom_shuttle.as_ref()),
            ("Bride's side", content.venue.bride_shuttle.as_ref()),
        ]
        .into_iter()
        .filter_map(|(side, shuttle)| shuttle.map(|shuttle| ShuttleCard { side, shuttle }))
        .collect();

        let guest_options = (1..=content.rsvp.max_guests)
            .map(|n| (n, if n == 1 { "1 guest".to_string() } else { format!("{} guests", n) }))
            .collect();

        Self {
            content,
            hero_image,
            edge_colors,
            couple,
            shuttles,
            gallery_images,
            gallery_middle: content.gallery.position == GalleryPosition::Middle,
            gallery_grid: content.gallery.layout == GalleryLayout::Grid,
            links: navigation_links(&content.venue),
            map: map_settings(&content.venue, &content.map),
            guest_options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_lists_configured_shuttles_and_guest_counts() {
        let mut content = WeddingContent::defaults().expect("defaults should parse");
        content.venue.bride_shuttle = None;
        content.rsvp.max_guests = 2;

        let page = IndexPage::new(&content, "/hero.jpg".to_string(), None, Vec::new());
        assert_eq!(page.shuttles.len(), 1);
        assert_eq!(page.shuttles[0].side, "Groom's side");
        assert_eq!(
            page.guest_options,
            vec![(1, "1 guest".to_string()), (2, "2 guests".to_string())]
        );
        assert_eq!(page.couple[0].parents, "Groom's father · Groom's mother");
        assert_eq!(page.couple[1].relation, "Daughter");
        assert!(!page.gallery_middle && page.gallery_grid);
    }
}

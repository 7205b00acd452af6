use chrono::{DateTime, FixedOffset, TimeZone};

use super::{
    parse_datetime, AtomElement, Author, Category, Contributor, Link, LinkLike, Relation,
    RepliesLink, RootElement, TypedLink,
};
use crate::error::Result;

/// Generates the named accessors for one link relation.
macro_rules! link_relation {
    ($rel:expr, $get:ident, $get_all:ident, $add:ident, $set:ident) => {
        fn $get(&self) -> Option<String> {
            self.link_href($rel)
        }

        fn $get_all(&self) -> Vec<String> {
            self.link_hrefs($rel)
        }

        fn $add(&self, href: &str) -> Link {
            self.add_link_href($rel, href)
        }

        fn $set(&self, href: &str) -> Link {
            self.set_link_href($rel, href)
        }
    };
}

/// Accessors shared by [`Feed`](super::Feed) and [`Entry`](super::Entry).
pub trait CoreElement: RootElement {
    fn id(&self) -> Option<String> {
        self.child_text("id")
    }

    fn set_id(&self, id: &str) {
        self.set_child_text("id", id);
    }

    fn title(&self) -> Option<String> {
        self.child_text("title")
    }

    fn set_title(&self, title: &str) {
        self.set_child_text("title", title);
    }

    fn rights(&self) -> Option<String> {
        self.child_text("rights")
    }

    fn set_rights(&self, rights: &str) {
        self.set_child_text("rights", rights);
    }

    fn updated(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.get_datetime(&self.namespace(), "updated")
    }

    fn set_updated<Tz>(&self, updated: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.set_datetime(&self.namespace(), "updated", updated);
    }

    // ------------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------------

    /// All links; `rel="replies"` links come back as [`RepliesLink`] views.
    fn links(&self) -> Vec<TypedLink> {
        self.get_all(&self.namespace(), "link")
            .into_iter()
            .map(TypedLink::from_element)
            .collect()
    }

    fn link(&self) -> Option<TypedLink> {
        self.get(&self.namespace(), "link")
            .map(TypedLink::from_element)
    }

    fn add_link<L: LinkLike>(&self, link: &L) -> Link {
        Link::from_element_unchecked(self.add(&self.namespace(), "link", link.to_child()))
    }

    /// Replaces every link with `link`.
    fn set_link<L: LinkLike>(&self, link: &L) -> Link {
        Link::from_element_unchecked(self.set(&self.namespace(), "link", link.to_child()))
    }

    /// Links with relation `rel`, in document order.
    fn links_by_relation(&self, rel: Relation) -> Vec<TypedLink> {
        self.links()
            .into_iter()
            .filter(|l| rel.matches(l.rel().as_deref()))
            .collect()
    }

    fn link_hrefs(&self, rel: Relation) -> Vec<String> {
        self.links_by_relation(rel)
            .iter()
            .filter_map(TypedLink::href)
            .collect()
    }

    fn link_href(&self, rel: Relation) -> Option<String> {
        self.links_by_relation(rel)
            .into_iter()
            .next()
            .and_then(|l| l.href())
    }

    fn add_link_href(&self, rel: Relation, href: &str) -> Link {
        self.add_link(&Link::with_rel(rel, href))
    }

    /// Removes the links with relation `rel`, then adds one to `href`.
    fn set_link_href(&self, rel: Relation, href: &str) -> Link {
        let ns = self.namespace();
        self.element()
            .remove_children_where(|e| e.is(&ns, "link") && rel.matches(e.attr("rel").as_deref()));
        self.add_link_href(rel, href)
    }

    link_relation!(Relation::SelfLink, self_link, self_links, add_self_link, set_self_link);
    link_relation!(Relation::Edit, edit_link, edit_links, add_edit_link, set_edit_link);
    link_relation!(
        Relation::EditMedia,
        edit_media_link,
        edit_media_links,
        add_edit_media_link,
        set_edit_media_link
    );
    link_relation!(Relation::Related, related_link, related_links, add_related_link, set_related_link);
    link_relation!(
        Relation::Enclosure,
        enclosure_link,
        enclosure_links,
        add_enclosure_link,
        set_enclosure_link
    );
    link_relation!(Relation::Via, via_link, via_links, add_via_link, set_via_link);
    link_relation!(Relation::First, first_link, first_links, add_first_link, set_first_link);
    link_relation!(
        Relation::Previous,
        previous_link,
        previous_links,
        add_previous_link,
        set_previous_link
    );
    link_relation!(Relation::Next, next_link, next_links, add_next_link, set_next_link);
    link_relation!(Relation::Last, last_link, last_links, add_last_link, set_last_link);
    link_relation!(
        Relation::Alternate,
        alternate_link,
        alternate_links,
        add_alternate_link,
        set_alternate_link
    );
    link_relation!(Relation::Replies, replies_link, replies_links, add_replies_link, set_replies_link);

    /// The first `rel="replies"` link, as a [`RepliesLink`].
    fn replies(&self) -> Option<RepliesLink> {
        self.links_by_relation(Relation::Replies)
            .into_iter()
            .find_map(|l| l.as_replies().cloned())
    }

    // ------------------------------------------------------------------------
    // Categories and people
    // ------------------------------------------------------------------------

    fn category(&self) -> Option<Category> {
        self.get_object(&self.namespace(), "category")
    }

    fn categories(&self) -> Vec<Category> {
        self.get_objects(&self.namespace(), "category")
    }

    fn add_category(&self, category: &Category) -> Category {
        Category::from_element_unchecked(self.add(&self.namespace(), "category", category.to_child()))
    }

    fn set_category(&self, category: &Category) -> Category {
        Category::from_element_unchecked(self.set(&self.namespace(), "category", category.to_child()))
    }

    fn author(&self) -> Option<Author> {
        self.get_object(&self.namespace(), "author")
    }

    fn authors(&self) -> Vec<Author> {
        self.get_objects(&self.namespace(), "author")
    }

    fn add_author(&self, author: &Author) -> Author {
        Author::from_element_unchecked(self.add(&self.namespace(), "author", author.to_child()))
    }

    fn set_author(&self, author: &Author) -> Author {
        Author::from_element_unchecked(self.set(&self.namespace(), "author", author.to_child()))
    }

    fn contributor(&self) -> Option<Contributor> {
        self.get_object(&self.namespace(), "contributor")
    }

    fn contributors(&self) -> Vec<Contributor> {
        self.get_objects(&self.namespace(), "contributor")
    }

    fn add_contributor(&self, contributor: &Contributor) -> Contributor {
        Contributor::from_element_unchecked(self.add(
            &self.namespace(),
            "contributor",
            contributor.to_child(),
        ))
    }

    fn set_contributor(&self, contributor: &Contributor) -> Contributor {
        Contributor::from_element_unchecked(self.set(
            &self.namespace(),
            "contributor",
            contributor.to_child(),
        ))
    }

    /// Handles the option keys every feed and entry accepts.
    fn set_core_option(&self, key: &str, value: &str) -> Result<bool> {
        match key {
            "id" => self.set_id(value),
            "title" => self.set_title(value),
            "rights" => self.set_rights(value),
            "updated" => self.set_updated(&parse_datetime(value)?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, PersonConstruct};
    use crate::namespace::Namespace;

    #[test]
    fn test_relation_accessors() {
        let entry = Entry::new();
        entry.add_self_link("http://example.org/self");
        entry.add_edit_link("http://example.org/edit");
        entry.add_edit_media_link("http://example.org/media");
        entry.add_related_link("http://example.org/a");
        entry.add_related_link("http://example.org/b");

        assert_eq!(entry.self_link().as_deref(), Some("http://example.org/self"));
        assert_eq!(entry.edit_link().as_deref(), Some("http://example.org/edit"));
        assert_eq!(entry.edit_media_link().as_deref(), Some("http://example.org/media"));
        assert_eq!(
            entry.related_links(),
            vec!["http://example.org/a", "http://example.org/b"]
        );
        assert_eq!(entry.via_link(), None);
        assert!(entry.next_links().is_empty());
    }

    #[test]
    fn test_relation_setter_replaces_only_that_relation() {
        let entry = Entry::new();
        entry.add_related_link("a");
        entry.add_related_link("b");
        entry.add_self_link("s");
        entry.set_related_link("c");

        assert_eq!(entry.related_links(), vec!["c"]);
        assert_eq!(entry.self_link().as_deref(), Some("s"));
        assert_eq!(entry.links().len(), 2);
    }

    #[test]
    fn test_alternate_includes_links_without_rel() {
        let entry = Entry::new();
        let bare = Link::new();
        bare.set_href("http://example.org/bare");
        entry.add_link(&bare);
        entry.add_alternate_link("http://example.org/alt");

        assert_eq!(
            entry.alternate_links(),
            vec!["http://example.org/bare", "http://example.org/alt"]
        );
        assert_eq!(entry.alternate_link().as_deref(), Some("http://example.org/bare"));
        assert!(entry.links().iter().all(|l| l.as_replies().is_none()));

        entry.set_alternate_link("http://example.org/new");
        assert_eq!(entry.alternate_links(), vec!["http://example.org/new"]);
    }

    #[test]
    fn test_replies_links_upgraded() {
        let entry = Entry::new();
        entry.add_alternate_link("http://example.org/");
        let replies = RepliesLink::new();
        replies.set_href("http://example.org/comments");
        replies.set_count(5);
        entry.add_link(&replies);

        let links = entry.links();
        assert!(links[0].as_replies().is_none());
        let upgraded = links[1].as_replies().unwrap();
        assert_eq!(upgraded.count().unwrap(), Some(5));

        assert_eq!(entry.replies().unwrap().count().unwrap(), Some(5));
        assert_eq!(entry.replies_link().as_deref(), Some("http://example.org/comments"));
    }

    #[test]
    fn test_single_link_upgraded() {
        let entry = Entry::new();
        entry.add_replies_link("http://example.org/comments");
        assert!(entry.link().unwrap().as_replies().is_some());
    }

    #[test]
    fn test_people_and_categories() {
        let entry = Entry::new();
        let author = Author::new();
        author.set_name("Mark");
        entry.add_author(&author);
        let other = Author::new();
        other.set_name("Sam");
        entry.add_author(&other);
        assert_eq!(entry.authors().len(), 2);

        entry.set_author(&other);
        assert_eq!(entry.authors().len(), 1);
        assert_eq!(entry.author().and_then(|a| a.name()).as_deref(), Some("Sam"));

        let category = Category::new();
        category.set_term("joke");
        entry.add_category(&category);
        assert_eq!(entry.category().and_then(|c| c.term()).as_deref(), Some("joke"));
        assert_eq!(entry.get_all(&Namespace::ATOM, "category").len(), 1);
    }

    #[test]
    fn test_set_title_twice_leaves_one() {
        let entry = Entry::new();
        entry.set_title("one");
        entry.set_title("two");
        assert_eq!(entry.get_all(&Namespace::ATOM, "title").len(), 1);
        assert_eq!(entry.title().as_deref(), Some("two"));
    }
}

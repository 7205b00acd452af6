use super::{in_namespace, unknown_option, AtomElement};
use crate::error::Result;
use crate::namespace::Namespace;
use crate::xml::XmlElement;

/// The Atom person construct: `name`, `email` and `uri` children.
pub trait PersonConstruct: AtomElement {
    fn name(&self) -> Option<String> {
        self.child_text("name")
    }

    fn set_name(&self, name: &str) {
        self.set_child_text("name", name);
    }

    fn email(&self) -> Option<String> {
        self.child_text("email")
    }

    fn set_email(&self, email: &str) {
        self.set_child_text("email", email);
    }

    fn uri(&self) -> Option<String> {
        self.child_text("uri")
    }

    fn set_uri(&self, uri: &str) {
        self.set_child_text("uri", uri);
    }

    /// Copies name, email and uri into a new, detached `T`.
    fn convert<T: PersonConstruct>(&self) -> T {
        let person = T::new();
        if let Some(name) = self.name() {
            person.set_name(&name);
        }
        if let Some(email) = self.email() {
            person.set_email(&email);
        }
        if let Some(uri) = self.uri() {
            person.set_uri(&uri);
        }
        person
    }

    fn set_person_option(&self, key: &str, value: &str) -> bool {
        match key {
            "name" => self.set_name(value),
            "email" => self.set_email(value),
            "uri" => self.set_uri(value),
            _ => return false,
        }
        true
    }
}

macro_rules! person_element {
    ($(#[$meta:meta])* $ty:ident, $name:literal) => {
        person_element!($(#[$meta])* $ty, $name, |element: &XmlElement| {
            element.local_name() == $name && in_namespace(element, &Namespace::ATOM)
        });
    };
    ($(#[$meta:meta])* $ty:ident, $name:literal, $accepts:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $ty {
            elem: XmlElement,
        }

        impl AtomElement for $ty {
            const NAME: &'static str = $name;

            fn accepts(element: &XmlElement) -> bool {
                ($accepts)(element)
            }

            fn from_element_unchecked(element: XmlElement) -> Self {
                $ty { elem: element }
            }

            fn element(&self) -> &XmlElement {
                &self.elem
            }

            fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
                if self.set_person_option(key, value) {
                    Ok(())
                } else {
                    Err(unknown_option::<Self>(key))
                }
            }
        }

        impl PersonConstruct for $ty {}

        impl $ty {
            pub fn to_author(&self) -> Author {
                self.convert()
            }

            pub fn to_contributor(&self) -> Contributor {
                self.convert()
            }
        }
    };
}

person_element!(
    /// An `author`.
    Author,
    "author"
);

person_element!(
    /// A `contributor`.
    Contributor,
    "contributor"
);

person_element!(
    /// A person not yet committed to a role. Views either an `author` or a
    /// `contributor` node; built fresh, it is an `author`.
    Person,
    "author",
    |element: &XmlElement| {
        matches!(element.local_name().as_str(), "author" | "contributor")
            && in_namespace(element, &Namespace::ATOM)
    }
);

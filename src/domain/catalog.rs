//! Static catalog of content resources.
//!
//! Every content type served by the API is described here once: its table,
//! typed fields, eager-loaded associations and who may read or write it.
//! Handlers, services and repositories are generic over [`ResourceDef`], so
//! adding a resource means adding an entry below and a matching migration.
//!
//! The resource `name` doubles as the URL segment (`/api/{name}`) and the
//! table name. Catalog identifiers are the only strings ever interpolated
//! into SQL.

use serde::Serialize;

/// Column every content table carries as its primary key.
pub const ID_COLUMN: &str = "id";

/// Columns managed by the database; never accepted from clients.
pub const MANAGED_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

/// Storage and validation type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum FieldKind {
    /// Short single-line text.
    Text,
    /// Long-form text (rich text, markdown).
    LongText,
    Integer,
    Float,
    Boolean,
    Timestamp,
    /// Array of strings (`TEXT[]`).
    List,
    Email,
    Url,
    /// URL of an uploaded or external image.
    Image,
    /// Foreign key to another catalog resource.
    Reference(&'static str),
}

impl FieldKind {
    /// Whether list endpoints accept `?field=value` equality filters on this kind.
    pub fn is_filterable(self) -> bool {
        matches!(
            self,
            FieldKind::Text | FieldKind::Boolean | FieldKind::Integer | FieldKind::Reference(_)
        )
    }
}

/// A single column of a content resource.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldDef {
    const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// How an associated resource is joined to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssociationKind {
    /// Target rows carry `foreign_key` pointing at the owner.
    HasMany { foreign_key: &'static str },
    /// Owner carries `foreign_key` pointing at a single target row.
    BelongsTo { foreign_key: &'static str },
    /// Rows are linked through `join_table(local_key, remote_key)`.
    ///
    /// `input_key` is the request field that replaces the link set
    /// (a list of target ids).
    ManyToMany {
        join_table: &'static str,
        local_key: &'static str,
        remote_key: &'static str,
        input_key: &'static str,
    },
}

/// An eager-loaded association, merged into records under `key`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Association {
    pub key: &'static str,
    pub target: &'static str,
    pub kind: AssociationKind,
}

/// Who may read and write a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Anyone reads; editors write.
    Public,
    /// Editors read and write.
    Private,
    /// Anyone creates (forms); editors read and update.
    Inbox,
}

/// Description of one content resource.
#[derive(Debug, Serialize)]
pub struct ResourceDef {
    pub name: &'static str,
    pub fields: &'static [FieldDef],
    pub associations: &'static [Association],
    /// Field a slug is generated from. `None` means the resource has no slug.
    pub slug_from: Option<&'static str>,
    pub visibility: Visibility,
}

impl ResourceDef {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn image_fields(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.fields.iter().filter(|f| f.kind == FieldKind::Image)
    }

    pub fn has_slug(&self) -> bool {
        self.slug_from.is_some()
    }

    pub fn association(&self, key: &str) -> Option<&'static Association> {
        self.associations.iter().find(|a| a.key == key)
    }

    /// Many-to-many associations together with their request `input_key`.
    pub fn link_inputs(&self) -> impl Iterator<Item = (&'static Association, &'static str)> {
        self.associations.iter().filter_map(|a| match a.kind {
            AssociationKind::ManyToMany { input_key, .. } => Some((a, input_key)),
            _ => None,
        })
    }
}

use FieldKind::*;

const HEROES: ResourceDef = ResourceDef {
    name: "heroes",
    fields: &[
        FieldDef::required("title", Text),
        FieldDef::optional("subtitle", Text),
        FieldDef::optional("description", LongText),
        FieldDef::optional("image", Image),
        FieldDef::optional("cta_label", Text),
        FieldDef::optional("cta_url", Url),
        FieldDef::optional("page", Text),
    ],
    associations: &[Association {
        key: "stats",
        target: "stats",
        kind: AssociationKind::HasMany {
            foreign_key: "hero_id",
        },
    }],
    slug_from: None,
    visibility: Visibility::Public,
};

const STATS: ResourceDef = ResourceDef {
    name: "stats",
    fields: &[
        FieldDef::optional("hero_id", Reference("heroes")),
        FieldDef::required("label", Text),
        FieldDef::required("value", Text),
        FieldDef::optional("icon", Text),
    ],
    associations: &[],
    slug_from: None,
    visibility: Visibility::Public,
};

const PROGRAMS: ResourceDef = ResourceDef {
    name: "programs",
    fields: &[
        FieldDef::required("title", Text),
        FieldDef::required("slug", Text),
        FieldDef::optional("summary", Text),
        FieldDef::optional("description", LongText),
        FieldDef::optional("image", Image),
        FieldDef::optional("icon", Text),
        FieldDef::optional("features", List),
    ],
    associations: &[],
    slug_from: Some("title"),
    visibility: Visibility::Public,
};

const PARTNERS: ResourceDef = ResourceDef {
    name: "partners",
    fields: &[
        FieldDef::required("name", Text),
        FieldDef::optional("logo", Image),
        FieldDef::optional("website", Url),
        FieldDef::optional("category", Text),
        FieldDef::optional("description", LongText),
    ],
    associations: &[],
    slug_from: None,
    visibility: Visibility::Public,
};

const EVENTS: ResourceDef = ResourceDef {
    name: "events",
    fields: &[
        FieldDef::required("title", Text),
        FieldDef::required("slug", Text),
        FieldDef::optional("description", LongText),
        FieldDef::optional("location", Text),
        FieldDef::optional("starts_at", Timestamp),
        FieldDef::optional("ends_at", Timestamp),
        FieldDef::optional("image", Image),
        FieldDef::optional("registration_url", Url),
        FieldDef::optional("featured", Boolean),
    ],
    associations: &[],
    slug_from: Some("title"),
    visibility: Visibility::Public,
};

const NEWS: ResourceDef = ResourceDef {
    name: "news",
    fields: &[
        FieldDef::required("title", Text),
        FieldDef::required("slug", Text),
        FieldDef::optional("excerpt", Text),
        FieldDef::optional("content", LongText),
        FieldDef::optional("image", Image),
        FieldDef::optional("author", Text),
        FieldDef::optional("published_at", Timestamp),
        FieldDef::optional("tags", List),
        FieldDef::optional("featured", Boolean),
    ],
    associations: &[],
    slug_from: Some("title"),
    visibility: Visibility::Public,
};

const CENTERS: ResourceDef = ResourceDef {
    name: "centers",
    fields: &[
        FieldDef::required("name", Text),
        FieldDef::required("slug", Text),
        FieldDef::optional("address", Text),
        FieldDef::optional("city", Text),
        FieldDef::optional("region", Text),
        FieldDef::optional("latitude", Float),
        FieldDef::optional("longitude", Float),
        FieldDef::optional("phone", Text),
        FieldDef::optional("email", Email),
        FieldDef::optional("description", LongText),
        FieldDef::optional("image", Image),
    ],
    associations: &[Association {
        key: "laboratories",
        target: "laboratories",
        kind: AssociationKind::ManyToMany {
            join_table: "center_laboratories",
            local_key: "center_id",
            remote_key: "laboratory_id",
            input_key: "laboratory_ids",
        },
    }],
    slug_from: Some("name"),
    visibility: Visibility::Public,
};

const LABORATORIES: ResourceDef = ResourceDef {
    name: "laboratories",
    fields: &[
        FieldDef::required("name", Text),
        FieldDef::optional("description", LongText),
        FieldDef::optional("image", Image),
        FieldDef::optional("icon", Text),
        FieldDef::optional("equipment", List),
    ],
    associations: &[],
    slug_from: None,
    visibility: Visibility::Public,
};

const WORKSHOPS: ResourceDef = ResourceDef {
    name: "workshops",
    fields: &[
        FieldDef::required("title", Text),
        FieldDef::optional("description", LongText),
        FieldDef::optional("center_id", Reference("centers")),
        FieldDef::optional("scheduled_at", Timestamp),
        FieldDef::optional("duration_minutes", Integer),
        FieldDef::optional("audience", Text),
        FieldDef::optional("image", Image),
    ],
    associations: &[Association {
        key: "center",
        target: "centers",
        kind: AssociationKind::BelongsTo {
            foreign_key: "center_id",
        },
    }],
    slug_from: None,
    visibility: Visibility::Public,
};

const TESTIMONIALS: ResourceDef = ResourceDef {
    name: "testimonials",
    fields: &[
        FieldDef::required("author", Text),
        FieldDef::optional("role", Text),
        FieldDef::required("quote", LongText),
        FieldDef::optional("image", Image),
    ],
    associations: &[],
    slug_from: None,
    visibility: Visibility::Public,
};

const TEAM_MEMBERS: ResourceDef = ResourceDef {
    name: "team_members",
    fields: &[
        FieldDef::required("name", Text),
        FieldDef::optional("position", Text),
        FieldDef::optional("bio", LongText),
        FieldDef::optional("image", Image),
        FieldDef::optional("linkedin_url", Url),
        FieldDef::optional("sort_order", Integer),
    ],
    associations: &[],
    slug_from: None,
    visibility: Visibility::Public,
};

const FAQS: ResourceDef = ResourceDef {
    name: "faqs",
    fields: &[
        FieldDef::required("question", Text),
        FieldDef::required("answer", LongText),
        FieldDef::optional("category", Text),
        FieldDef::optional("sort_order", Integer),
    ],
    associations: &[],
    slug_from: None,
    visibility: Visibility::Public,
};

const GALLERY_ITEMS: ResourceDef = ResourceDef {
    name: "gallery_items",
    fields: &[
        FieldDef::optional("title", Text),
        FieldDef::optional("caption", Text),
        FieldDef::required("image", Image),
        FieldDef::optional("category", Text),
    ],
    associations: &[],
    slug_from: None,
    visibility: Visibility::Public,
};

const CONTACT_MESSAGES: ResourceDef = ResourceDef {
    name: "contact_messages",
    fields: &[
        FieldDef::required("name", Text),
        FieldDef::required("email", Email),
        FieldDef::optional("subject", Text),
        FieldDef::required("message", LongText),
        FieldDef::optional("handled", Boolean),
    ],
    associations: &[],
    slug_from: None,
    visibility: Visibility::Inbox,
};

const NEWSLETTER_SUBSCRIBERS: ResourceDef = ResourceDef {
    name: "newsletter_subscribers",
    fields: &[
        FieldDef::required("email", Email),
        FieldDef::optional("name", Text),
    ],
    associations: &[],
    slug_from: None,
    visibility: Visibility::Inbox,
};

static CATALOG: &[ResourceDef] = &[
    HEROES,
    STATS,
    PROGRAMS,
    PARTNERS,
    EVENTS,
    NEWS,
    CENTERS,
    LABORATORIES,
    WORKSHOPS,
    TESTIMONIALS,
    TEAM_MEMBERS,
    FAQS,
    GALLERY_ITEMS,
    CONTACT_MESSAGES,
    NEWSLETTER_SUBSCRIBERS,
];

/// All resources, in catalog order.
pub fn all() -> &'static [ResourceDef] {
    CATALOG
}

/// Looks up a resource by its URL segment.
pub fn find(name: &str) -> Option<&'static ResourceDef> {
    CATALOG.iter().find(|r| r.name == name)
}

/// Resources whose rendered rows change when `name` is written.
///
/// These either eager-load `name` through an association or hold a foreign
/// key to it (deletes cascade or null the key).
pub fn dependents(name: &str) -> impl Iterator<Item = &'static ResourceDef> + '_ {
    CATALOG.iter().filter(move |r| {
        r.name != name
            && (r.associations.iter().any(|a| a.target == name)
                || r
                    .fields
                    .iter()
                    .any(|f| matches!(f.kind, FieldKind::Reference(target) if target == name)))
    })
}

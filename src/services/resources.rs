use std::sync::RwLock;

use crate::models::{Resource, ResourceCategory};

/// In-memory catalog of study and campus resources
///
/// Built once at start-up and shared through the application state.
#[derive(Debug, Default)]
pub struct ResourceCatalog {
    entries: RwLock<Vec<Resource>>,
}

impl ResourceCatalog {
    pub fn new(entries: Vec<Resource>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Catalog seeded with the standard entries
    pub fn with_defaults() -> Self {
        Self::new(default_resources())
    }

    /// Standard entries followed by the ones configured under `[[resources]]`
    pub fn with_extras(extras: Vec<Resource>) -> Self {
        let catalog = Self::with_defaults();
        for extra in extras {
            catalog.add(extra.category, extra);
        }
        catalog
    }

    /// Add a resource under `category`, overriding whatever category it carried
    pub fn add(&self, category: ResourceCategory, mut resource: Resource) {
        resource.category = category;
        tracing::debug!("Adding resource {} to {:?}", resource.id, category);
        match self.entries.write() {
            Ok(mut entries) => entries.push(resource),
            Err(poisoned) => poisoned.into_inner().push(resource),
        }
    }

    fn snapshot(&self) -> Vec<Resource> {
        match self.entries.read() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// All resources: academic, then transport, then special
    pub fn all(&self) -> Vec<Resource> {
        let mut all = self.snapshot();
        all.sort_by_key(|r| match r.category {
            ResourceCategory::Academic => 0,
            ResourceCategory::Transport => 1,
            ResourceCategory::Special => 2,
        });
        all
    }

    pub fn featured(&self) -> Vec<Resource> {
        self.all().into_iter().filter(|r| r.featured).collect()
    }

    pub fn by_category(&self, category: ResourceCategory) -> Vec<Resource> {
        self.all()
            .into_iter()
            .filter(|r| r.category == category)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Resource> {
        self.snapshot().into_iter().find(|r| r.id == id)
    }
}

#[allow(clippy::too_many_arguments)]
fn resource(
    id: &str,
    title: &str,
    description: &str,
    category: ResourceCategory,
    icon: &str,
    url: &str,
    tags: &[&str],
    featured: bool,
) -> Resource {
    Resource {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category,
        icon: icon.to_string(),
        url: url.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        featured,
    }
}

fn default_resources() -> Vec<Resource> {
    use ResourceCategory::*;
    vec![
        resource(
            "case-study-guide",
            "Case Study Preparation Guide",
            "Essential tips and frameworks for mastering case study interviews.",
            Academic,
            "BookOpen",
            "#",
            &["Case Studies", "Interviews", "Frameworks"],
            false,
        ),
        resource(
            "consulting-resources",
            "Consulting Resources Hub",
            "Curated resources for consulting career preparation and interview practice.",
            Academic,
            "BookOpen",
            "#",
            &["Consulting", "Career", "Interviews"],
            false,
        ),
        resource(
            "cabpooling",
            "Airport Cabpooling Platform",
            "Find ride-sharing partners for airport transfers arriving around the same time.",
            Transport,
            "Car",
            "#",
            &["Transport", "Airport", "Cost Sharing"],
            true,
        ),
        resource(
            "study-groups",
            "Study Group Finder",
            "Connect with students studying similar topics or preparing for the same interviews.",
            Special,
            "Users",
            "/sessions/match",
            &["Study Groups", "Collaboration"],
            false,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_grouped_by_category() {
        let catalog = ResourceCatalog::with_defaults();
        let categories: Vec<ResourceCategory> = catalog.all().iter().map(|r| r.category).collect();
        let mut sorted = categories.clone();
        sorted.dedup();
        assert_eq!(
            sorted,
            vec![
                ResourceCategory::Academic,
                ResourceCategory::Transport,
                ResourceCategory::Special
            ]
        );
    }

    #[test]
    fn test_add_sets_category_and_features() {
        let catalog = ResourceCatalog::default();
        let mut r = resource("x", "X", "", ResourceCategory::Special, "Users", "#", &[], true);
        r.category = ResourceCategory::Transport;
        catalog.add(ResourceCategory::Academic, r);

        assert_eq!(catalog.by_category(ResourceCategory::Academic).len(), 1);
        assert!(catalog.by_category(ResourceCategory::Transport).is_empty());
        assert_eq!(catalog.featured().len(), 1);
        assert_eq!(catalog.get("x").map(|r| r.category), Some(ResourceCategory::Academic));
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_extras_follow_defaults() {
        let extra = resource("alumni", "Alumni Network", "", ResourceCategory::Special, "Users", "#", &[], false);
        let catalog = ResourceCatalog::with_extras(vec![extra]);

        let special = catalog.by_category(ResourceCategory::Special);
        assert_eq!(special.len(), 2);
        assert_eq!(special[1].id, "alumni");
        assert!(catalog.get("cabpooling").is_some());
    }
}

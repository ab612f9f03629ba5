use super::geometry::Size;

/// Fallback frame size for definitions that do not name one.
pub const DEFAULT_APP_SIZE: Size = Size::new(600, 400);

/// Static description of a launchable application.
///
/// `factory` builds the opaque content handle for one window. It runs exactly
/// once per open; `P` carries collaborator-supplied props such as the
/// wallpaper setter handed to the settings app.
pub struct AppDefinition<C, P = ()> {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub default_size: Option<Size>,
    pub description: &'static str,
    pub factory: fn(Option<&P>) -> C,
}

impl<C, P> AppDefinition<C, P> {
    pub fn initial_size(&self) -> Size {
        self.default_size.unwrap_or(DEFAULT_APP_SIZE)
    }

    pub fn instantiate(&self, props: Option<&P>) -> C {
        (self.factory)(props)
    }
}

impl<C, P> Clone for AppDefinition<C, P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name,
            icon: self.icon,
            default_size: self.default_size,
            description: self.description,
            factory: self.factory,
        }
    }
}

/// Ordered set of application definitions, looked up by id.
pub struct AppCatalog<C, P = ()> {
    apps: Vec<AppDefinition<C, P>>,
}

impl<C, P> AppCatalog<C, P> {
    pub fn new(apps: Vec<AppDefinition<C, P>>) -> Self {
        Self { apps }
    }

    pub fn find(&self, id: &str) -> Option<&AppDefinition<C, P>> {
        self.apps.iter().find(|app| app.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppDefinition<C, P>> {
        self.apps.iter()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(_: Option<&()>) -> u8 {
        7
    }

    #[test]
    fn missing_default_size_falls_back() {
        let def: AppDefinition<u8> = AppDefinition {
            id: "x",
            name: "X",
            icon: "?",
            default_size: None,
            description: "",
            factory: make,
        };
        assert_eq!(def.initial_size(), DEFAULT_APP_SIZE);
        assert_eq!(def.instantiate(None), 7);
    }

    #[test]
    fn catalog_lookup_by_id() {
        let def: AppDefinition<u8> = AppDefinition {
            id: "notepad",
            name: "Notepad",
            icon: "N",
            default_size: Some(Size::new(500, 400)),
            description: "",
            factory: make,
        };
        let catalog = AppCatalog::new(vec![def]);
        assert!(catalog.find("notepad").is_some());
        assert!(catalog.find("paint").is_none());
        assert_eq!(catalog.len(), 1);
    }
}

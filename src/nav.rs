pub const SCROLLED_OFFSET_PX: f64 = 20.0;
/// Shrinks the observation root to the viewport's horizontal midline.
pub const ACTIVE_SECTION_ROOT_MARGIN: &str = "-50% 0px -50% 0px";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavLink {
    pub name: &'static str,
    pub id: &'static str,
    pub icon: &'static str,
}

impl NavLink {
    pub fn href(&self) -> String {
        format!("#{}", self.id)
    }
}

pub const NAV_LINKS: [NavLink; 7] = [
    NavLink { name: "Home", id: "home", icon: "🏠" },
    NavLink { name: "About", id: "about", icon: "👨‍💻" },
    NavLink { name: "Services", id: "services", icon: "🛠️" },
    NavLink { name: "Skills", id: "skills", icon: "⚡" },
    NavLink { name: "Projects", id: "projects", icon: "🚀" },
    NavLink { name: "Experience", id: "experience", icon: "💼" },
    NavLink { name: "Contact", id: "contact", icon: "📧" },
];

pub fn is_scrolled(scroll_y: f64) -> bool {
    scroll_y > SCROLLED_OFFSET_PX
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavState {
    pub active: &'static str,
    pub scrolled: bool,
    pub menu_open: bool,
}

impl Default for NavState {
    fn default() -> Self {
        Self {
            active: NAV_LINKS[0].name,
            scrolled: false,
            menu_open: false,
        }
    }
}

impl NavState {
    pub fn scrolled_to(self, scroll_y: f64) -> Self {
        Self {
            scrolled: is_scrolled(scroll_y),
            ..self
        }
    }

    /// Unknown section ids leave the active link unchanged.
    pub fn crossed(self, section_id: &str) -> Self {
        let Some(link) = NAV_LINKS.iter().find(|link| link.id == section_id) else {
            return self;
        };

        Self {
            active: link.name,
            ..self
        }
    }

    pub fn toggled_menu(self) -> Self {
        Self {
            menu_open: !self.menu_open,
            ..self
        }
    }

    pub fn followed(self, link: &NavLink) -> Self {
        Self {
            active: link.name,
            menu_open: false,
            ..self
        }
    }

    pub fn locks_body_scroll(&self) -> bool {
        self.menu_open
    }
}

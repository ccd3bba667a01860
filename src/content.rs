use crate::typewriter::CycleEntry;

pub const OWNER_NAME: &str = "Himanshu Jangid";
pub const OWNER_LOCATION: &str = "Ajmer, Rajasthan, India";
pub const ROLE_HOLD_MILLIS: u32 = 1_000;
pub const ROLE_CHAR_INTERVAL_MILLIS: u32 = 60;
pub const HERO_ROLES: [&str; 4] = [
    "Full-Stack Developer",
    "MERN Stack Specialist",
    "Laravel Developer",
    "Backend Engineer",
];

pub fn hero_role_entries() -> Vec<CycleEntry> {
    HERO_ROLES
        .iter()
        .map(|role| CycleEntry::new(*role, ROLE_HOLD_MILLIS))
        .collect()
}

pub struct Highlight {
    pub icon: &'static str,
    pub value: &'static str,
    pub label: &'static str,
}

pub const ACHIEVEMENTS: [Highlight; 4] = [
    Highlight { icon: "🚀", value: "3+", label: "Core Projects" },
    Highlight { icon: "💼", value: "1+", label: "Year Experience" },
    Highlight { icon: "📚", value: "2", label: "Full Stacks" },
    Highlight { icon: "⭐", value: "90%", label: "Security Improvement" },
];

pub const QUICK_FACTS: [Highlight; 4] = [
    Highlight { icon: "🎯", value: "Full Stack Development", label: "Focus" },
    Highlight { icon: "📍", value: "Ajmer, Rajasthan", label: "Location" },
    Highlight { icon: "💡", value: "1+ Year", label: "Experience" },
    Highlight { icon: "🚀", value: "Available for Projects", label: "Status" },
];

pub struct Skill {
    pub name: &'static str,
    pub icon: &'static str,
    pub level: u8,
    pub category: &'static str,
}

pub const TECH_STACK: [(&str, &str); 8] = [
    ("React.js", "Re"),
    ("Node.js", "N"),
    ("MongoDB", "DB"),
    ("Laravel", "La"),
    ("PHP", "php"),
    ("MySQL", "SQL"),
    ("JavaScript", "JS"),
    ("Tailwind", "Tw"),
];

pub const TECHNICAL_SKILLS: [Skill; 6] = [
    Skill { name: "JavaScript", icon: "⚡", level: 90, category: "Language" },
    Skill { name: "React", icon: "⚛️", level: 85, category: "Framework" },
    Skill { name: "Node.js", icon: "🟢", level: 80, category: "Runtime" },
    Skill { name: "CSS/Tailwind", icon: "🎨", level: 88, category: "Styling" },
    Skill { name: "MongoDB", icon: "🍃", level: 75, category: "Database" },
    Skill { name: "Git", icon: "📝", level: 82, category: "Version Control" },
];

pub const SOFT_SKILLS: [Skill; 4] = [
    Skill { name: "Problem Solving", icon: "🧩", level: 92, category: "Soft" },
    Skill { name: "Team Collaboration", icon: "🤝", level: 88, category: "Soft" },
    Skill { name: "Communication", icon: "💬", level: 85, category: "Soft" },
    Skill { name: "Time Management", icon: "⏰", level: 90, category: "Soft" },
];

pub struct Service {
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

pub const SERVICES: [Service; 4] = [
    Service {
        name: "MERN Stack Development",
        icon: "📚",
        description: "Building full-stack apps with MongoDB, Express, React, & Node.",
    },
    Service {
        name: "Laravel Development",
        icon: "🐘",
        description: "Crafting powerful applications with the elegance of PHP and Laravel.",
    },
    Service {
        name: "API Development",
        icon: "⚙️",
        description: "Designing and implementing secure, scalable RESTful APIs with JWT.",
    },
    Service {
        name: "Real-Time Applications",
        icon: "💬",
        description: "Integrating real-time features using technologies like Socket.IO.",
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectCategory {
    Frontend,
    Backend,
    FullStack,
}

impl ProjectCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::FullStack => "fullstack",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProjectFilter {
    #[default]
    All,
    Only(ProjectCategory),
}

impl ProjectFilter {
    pub const CHOICES: [ProjectFilter; 4] = [
        ProjectFilter::All,
        ProjectFilter::Only(ProjectCategory::Frontend),
        ProjectFilter::Only(ProjectCategory::Backend),
        ProjectFilter::Only(ProjectCategory::FullStack),
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Projects",
            Self::Only(ProjectCategory::Frontend) => "Frontend",
            Self::Only(ProjectCategory::Backend) => "Backend",
            Self::Only(ProjectCategory::FullStack) => "Full Stack",
        }
    }

    pub fn accepts(self, project: &Project) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => project.category == category,
        }
    }

    pub fn count(self, projects: &[Project]) -> usize {
        projects.iter().filter(|project| self.accepts(project)).count()
    }
}

pub const GITHUB_PROFILE_URL: &str = "https://github.com/HimanshuJangid2147";

/// Outbound links for a project card. `live` is absent until a deployment exists.
pub struct ProjectLinks {
    pub live: Option<&'static str>,
    pub github: &'static str,
}

pub struct Project {
    pub title: &'static str,
    pub description: &'static str,
    pub category: ProjectCategory,
    pub technologies: &'static [&'static str],
    pub features: &'static [&'static str],
    pub year: &'static str,
    pub status: &'static str,
    pub links: ProjectLinks,
}

pub const PROJECTS: [Project; 6] = [
    Project {
        title: "E-Commerce Platform",
        description: "A full-stack e-commerce solution with modern UI/UX, secure payment integration, and admin dashboard.",
        category: ProjectCategory::FullStack,
        technologies: &["React", "Node.js", "MongoDB", "Stripe"],
        features: &["User Authentication", "Payment Gateway", "Admin Panel", "Responsive Design"],
        year: "2024",
        status: "Completed",
        links: ProjectLinks {
            live: None,
            github: "https://github.com/HimanshuJangid2147/e-commerce-platform",
        },
    },
    Project {
        title: "Task Management App",
        description: "A collaborative task management application with real-time updates, drag-and-drop functionality.",
        category: ProjectCategory::Frontend,
        technologies: &["React", "Redux", "Socket.io", "CSS3"],
        features: &["Real-time Sync", "Drag & Drop", "Team Boards"],
        year: "2024",
        status: "Completed",
        links: ProjectLinks {
            live: None,
            github: "https://github.com/HimanshuJangid2147/task-management-app",
        },
    },
    Project {
        title: "Weather Dashboard",
        description: "A beautiful weather application with location-based forecasts, interactive maps, and data visualization.",
        category: ProjectCategory::Frontend,
        technologies: &["React", "Chart.js", "OpenWeather API", "Tailwind"],
        features: &["Location Forecasts", "Interactive Maps", "Charts"],
        year: "2023",
        status: "Completed",
        links: ProjectLinks {
            live: None,
            github: "https://github.com/HimanshuJangid2147/weather-dashboard",
        },
    },
    Project {
        title: "REST API Server",
        description: "A scalable RESTful API with authentication, rate limiting, and comprehensive documentation.",
        category: ProjectCategory::Backend,
        technologies: &["Node.js", "Express", "JWT", "Swagger"],
        features: &["JWT Auth", "Rate Limiting", "API Docs"],
        year: "2024",
        status: "Completed",
        links: ProjectLinks {
            live: None,
            github: "https://github.com/HimanshuJangid2147/rest-api-server",
        },
    },
    Project {
        title: "Portfolio Website",
        description: "A modern, responsive portfolio website with smooth animations and interactive elements.",
        category: ProjectCategory::Frontend,
        technologies: &["React", "Tailwind", "Framer Motion", "Three.js"],
        features: &["Scroll Reveals", "3D Cards", "Code Rain"],
        year: "2025",
        status: "Live",
        links: ProjectLinks {
            live: Some("/"),
            github: "https://github.com/HimanshuJangid2147/portfolio",
        },
    },
    Project {
        title: "Chat Application",
        description: "Real-time chat application with rooms, file sharing, and modern messaging features.",
        category: ProjectCategory::FullStack,
        technologies: &["React", "Socket.io", "Node.js", "MongoDB"],
        features: &["Rooms", "File Sharing", "Typing Indicators"],
        year: "2023",
        status: "Completed",
        links: ProjectLinks {
            live: None,
            github: "https://github.com/HimanshuJangid2147/chat-application",
        },
    },
];

pub struct Experience {
    pub company: &'static str,
    pub role: &'static str,
    pub period: &'static str,
    pub achievements: &'static [&'static str],
}

pub const EXPERIENCE: [Experience; 1] = [Experience {
    company: "Arth Technocracy Pvt. Ltd.",
    role: "Associate Software Developer",
    period: "Sept 2024 - Present",
    achievements: &[
        "Developed MahiAdorn e-commerce platform using Laravel & PHP, increasing client revenue by 35%.",
        "Built Medicus hospital management system (MERN stack), reducing patient wait times by 45% and administrative workload by 60%.",
        "Implemented JWT authentication across 4 enterprise projects, decreasing security vulnerabilities by 90%.",
        "Optimised database queries and API response times by 65%, significantly improving application performance.",
        "Delivered all client projects with a 100% on-time completion rate through effective Agile sprint planning.",
    ],
}];

pub struct ContactDetail {
    pub icon: &'static str,
    pub label: &'static str,
    pub value: &'static str,
    pub href: &'static str,
}

pub const CONTACT_DETAILS: [ContactDetail; 3] = [
    ContactDetail {
        icon: "📧",
        label: "Email",
        value: "jangidhimanshu2000@gmail.com",
        href: "mailto:jangidhimanshu2000@gmail.com",
    },
    ContactDetail {
        icon: "📞",
        label: "Phone",
        value: "+91 86198 87533",
        href: "tel:+918619887533",
    },
    ContactDetail {
        icon: "📍",
        label: "Location",
        value: OWNER_LOCATION,
        href: "#contact",
    },
];

/// Entrance delay for the `index`-th card of a staggered grid, in seconds.
pub fn stagger_delay(index: usize) -> f64 {
    0.1 * index as f64
}

use crate::browser::{
    prefers_reduced_motion, scroll_offset, warn, BrowserScheduler, CanvasSurface,
    IntersectionSource, MathRandom,
};
use devfolio::code_rain::RainHandle;
use devfolio::content::{
    hero_role_entries, stagger_delay, ProjectFilter, Skill, ACHIEVEMENTS, CONTACT_DETAILS, EXPERIENCE,
    GITHUB_PROFILE_URL, OWNER_LOCATION, OWNER_NAME, PROJECTS, QUICK_FACTS, ROLE_CHAR_INTERVAL_MILLIS,
    SERVICES, SOFT_SKILLS, TECHNICAL_SKILLS, TECH_STACK,
};
use devfolio::nav::{NavLink, NavState, ACTIVE_SECTION_ROOT_MARGIN, NAV_LINKS};
use devfolio::reveal::{Rect, RevealConfig, VisibilitySource, VisibilityTracker};
use devfolio::schedule::Scheduler;
use devfolio::tilt::Tilt;
use devfolio::typewriter::{CycleEntry, CyclerConfig, Rendered, TextCycler};
use gloo_events::EventListener;
use gloo_net::http::Request;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    window, Element, Event, HtmlFormElement, HtmlInputElement, HtmlTextAreaElement, MouseEvent,
    SubmitEvent,
};
use yew::prelude::*;

const CLOCK_TICK_MILLIS: u32 = 1_000;
const CLOCK_LOCALE: &str = "en-IN";
const CONTACT_SENT_MESSAGE: &str = "Message sent successfully! I will get back to you soon.";
const CONTACT_FAILED_MESSAGE: &str = "Failed to send message. Please try again later.";
const STATS_PLACEHOLDER: &str = "...";

/// Flips to `true` the first time the referenced element scrolls into view, then stays there.
#[hook]
fn use_reveal() -> (NodeRef, bool) {
    let node = use_node_ref();
    let revealed = use_state_eq(|| false);

    {
        let node = node.clone();
        let revealed = revealed.clone();
        use_effect_with((), move |_| {
            let element = node.cast::<Element>();
            let tracker = VisibilityTracker::create(
                &IntersectionSource::default(),
                element.as_ref(),
                RevealConfig::default(),
            );
            tracker.on_trigger(move || revealed.set(true));

            move || tracker.destroy()
        });
    }

    (node, *revealed)
}

#[hook]
fn use_typewriter(entries: Vec<CycleEntry>, config: CyclerConfig) -> Rendered {
    let text = use_state_eq(Rendered::empty);

    {
        let text = text.clone();
        use_effect_with((entries, config), move |(entries, config)| {
            let cycler = TextCycler::create(entries.clone(), *config, BrowserScheduler, move |next| {
                text.set(next)
            })
            .map_err(|error| warn(&format!("role cycler disabled: {error}")))
            .ok();

            move || drop(cycler)
        });
    }

    (*text).clone()
}

fn local_time() -> String {
    js_sys::Date::new_0()
        .to_locale_time_string(CLOCK_LOCALE)
        .into()
}

#[hook]
fn use_clock() -> String {
    let now = use_state_eq(local_time);

    {
        let now = now.clone();
        use_effect_with((), move |_| {
            let task = BrowserScheduler.interval(CLOCK_TICK_MILLIS, move || now.set(local_time()));
            move || drop(task)
        });
    }

    (*now).clone()
}

#[function_component(CodeRainBackdrop)]
fn code_rain_backdrop() -> Html {
    let canvas = use_node_ref();

    {
        let canvas = canvas.clone();
        use_effect_with((), move |_| {
            let handle = if prefers_reduced_motion() {
                None
            } else {
                RainHandle::mount(CanvasSurface::from_node(&canvas), &BrowserScheduler, MathRandom)
                    .map(Rc::new)
            };

            let listener = match (window(), handle.clone()) {
                (Some(win), Some(handle)) => {
                    Some(EventListener::new(&win, "resize", move |_: &Event| handle.resize()))
                }
                _ => None,
            };

            move || {
                drop(listener);
                drop(handle);
            }
        });
    }

    html! {
        <canvas ref={canvas} class="code-rain" aria-hidden="true"></canvas>
    }
}

#[derive(Properties, PartialEq)]
struct Card3DProps {
    #[prop_or_default]
    children: Children,
    #[prop_or_default]
    class: Classes,
    #[prop_or_default]
    delay: f64,
    #[prop_or(true)]
    visible: bool,
}

#[function_component(Card3D)]
fn card_3d(props: &Card3DProps) -> Html {
    let node = use_node_ref();
    let tilt = use_state_eq(Tilt::flat);

    let onmousemove = {
        let node = node.clone();
        let tilt = tilt.clone();
        Callback::from(move |event: MouseEvent| {
            let Some(element) = node.cast::<Element>() else {
                return;
            };
            let bounds = element.get_bounding_client_rect();
            let card = Rect::new(bounds.left(), bounds.top(), bounds.width(), bounds.height());
            tilt.set(Tilt::toward(
                card,
                f64::from(event.client_x()),
                f64::from(event.client_y()),
            ));
        })
    };

    let onmouseenter = {
        let tilt = tilt.clone();
        Callback::from(move |_: MouseEvent| tilt.set((*tilt).hovered()))
    };

    let onmouseleave = {
        let tilt = tilt.clone();
        Callback::from(move |_: MouseEvent| tilt.set(Tilt::flat()))
    };

    html! {
        <div
            class={classes!("card-enter", props.visible.then_some("is-visible"))}
            style={format!("transition-delay: {:.1}s;", props.delay)}
        >
            <div
                ref={node}
                class={classes!("card-3d", props.class.clone())}
                style={tilt.style()}
                onmousemove={onmousemove}
                onmouseenter={onmouseenter}
                onmouseleave={onmouseleave}
            >
                { props.children.clone() }
            </div>
        </div>
    }
}

#[derive(Clone, Copy, PartialEq)]
struct NavModel(NavState);

enum NavAction {
    Scrolled(f64),
    Crossed(&'static str),
    ToggleMenu,
    Follow(NavLink),
}

impl Reducible for NavModel {
    type Action = NavAction;

    fn reduce(self: Rc<Self>, action: NavAction) -> Rc<Self> {
        let current = self.0;
        let next = match action {
            NavAction::Scrolled(offset) => current.scrolled_to(offset),
            NavAction::Crossed(section_id) => current.crossed(section_id),
            NavAction::ToggleMenu => current.toggled_menu(),
            NavAction::Follow(link) => current.followed(&link),
        };

        if next == current {
            self
        } else {
            Rc::new(Self(next))
        }
    }
}

fn set_body_overflow(value: &str) {
    let Some(body) = window().and_then(|w| w.document()).and_then(|d| d.body()) else {
        return;
    };
    let _ = body.style().set_property("overflow", value);
}

#[function_component(Navbar)]
fn navbar() -> Html {
    let nav = use_reducer_eq(|| NavModel(NavState::default()));

    {
        let dispatcher = nav.dispatcher();
        use_effect_with((), move |_| {
            dispatcher.dispatch(NavAction::Scrolled(scroll_offset()));
            let listener = window().map(|win| {
                EventListener::new(&win, "scroll", move |_: &Event| {
                    dispatcher.dispatch(NavAction::Scrolled(scroll_offset()))
                })
            });

            move || drop(listener)
        });
    }

    {
        let dispatcher = nav.dispatcher();
        use_effect_with((), move |_| {
            let source = IntersectionSource::with_root_margin(ACTIVE_SECTION_ROOT_MARGIN);
            let document = window().and_then(|w| w.document());
            let subscriptions: Vec<_> = NAV_LINKS
                .iter()
                .filter_map(|link| {
                    let section = document.as_ref()?.get_element_by_id(link.id)?;
                    let dispatcher = dispatcher.clone();
                    let section_id = link.id;
                    Some(source.observe(&section, 0.0, move |observation| {
                        if observation.intersecting {
                            dispatcher.dispatch(NavAction::Crossed(section_id));
                        }
                    }))
                })
                .collect();

            move || drop(subscriptions)
        });
    }

    {
        let locked = nav.0.locks_body_scroll();
        use_effect_with(locked, move |locked| {
            set_body_overflow(if *locked { "hidden" } else { "" });
            || set_body_overflow("")
        });
    }

    let on_toggle = {
        let dispatcher = nav.dispatcher();
        Callback::from(move |_: MouseEvent| dispatcher.dispatch(NavAction::ToggleMenu))
    };

    let on_follow = {
        let dispatcher = nav.dispatcher();
        Callback::from(move |link: NavLink| dispatcher.dispatch(NavAction::Follow(link)))
    };

    let state = nav.0;
    let render_link = |link: &NavLink| {
        let link = *link;
        html! {
            <li key={link.id}>
                <a
                    href={link.href()}
                    class={classes!("nav-link", (state.active == link.name).then_some("is-active"))}
                    aria-current={(state.active == link.name).then_some("page")}
                    onclick={on_follow.reform(move |_: MouseEvent| link)}
                >
                    <span class="nav-icon" aria-hidden="true">{link.icon}</span>
                    {link.name}
                </a>
            </li>
        }
    };

    html! {
        <header class={classes!("site-nav", state.scrolled.then_some("is-scrolled"))}>
            <nav aria-label="Primary">
                <a class="brand" href="#home">{OWNER_NAME}</a>
                <ul class="nav-links">
                    { for NAV_LINKS.iter().map(render_link) }
                </ul>
                <button
                    class="menu-toggle"
                    type="button"
                    aria-label="Toggle navigation menu"
                    aria-expanded={state.menu_open.to_string()}
                    onclick={on_toggle}
                >
                    <span aria-hidden="true">{if state.menu_open { "✕" } else { "☰" }}</span>
                </button>
            </nav>
            if state.menu_open {
                <ul class="mobile-menu">
                    { for NAV_LINKS.iter().map(render_link) }
                </ul>
            }
        </header>
    }
}

#[derive(Clone, Copy, PartialEq)]
struct GithubStats {
    public_repos: u64,
    followers: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiStatsResponse {
    ok: bool,
    public_repos: Option<u64>,
    followers: Option<u64>,
}

async fn fetch_github_stats() -> Option<GithubStats> {
    let response = Request::get("/api/github-stats").send().await.ok()?;
    let payload = response.json::<ApiStatsResponse>().await.ok()?;

    if !payload.ok {
        return None;
    }

    Some(GithubStats {
        public_repos: payload.public_repos?,
        followers: payload.followers?,
    })
}

#[function_component(GithubStatsBadge)]
fn github_stats_badge() -> Html {
    let stats = use_state_eq(|| None::<GithubStats>);

    {
        let stats = stats.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                if let Some(fetched) = fetch_github_stats().await {
                    stats.set(Some(fetched));
                }
            });
            || ()
        });
    }

    let (repos, followers) = match *stats {
        Some(loaded) => (loaded.public_repos.to_string(), loaded.followers.to_string()),
        None => (STATS_PLACEHOLDER.to_string(), STATS_PLACEHOLDER.to_string()),
    };

    html! {
        <dl class="github-stats">
            <div><dt>{"Public repos"}</dt><dd>{repos}</dd></div>
            <div><dt>{"Followers"}</dt><dd>{followers}</dd></div>
        </dl>
    }
}

#[function_component(HeroSection)]
fn hero_section() -> Html {
    let (node, visible) = use_reveal();
    let role = use_typewriter(
        hero_role_entries(),
        CyclerConfig::with_char_interval(ROLE_CHAR_INTERVAL_MILLIS),
    );
    let clock = use_clock();

    html! {
        <section id="home" ref={node} class={classes!("hero", visible.then_some("is-visible"))}>
            <p class="hero-clock">{format!("{OWNER_LOCATION} · {clock}")}</p>
            <h1>{"Hi, I'm "}<span class="accent">{OWNER_NAME}</span></h1>
            <p class="hero-role" aria-live="polite">
                <span>{role.prefix}</span>
                <span class="caret" aria-hidden="true">{role.caret.to_string()}</span>
            </p>
            <div class="hero-actions">
                <a class="button primary" href="#projects">{"View My Work"}</a>
                <a class="button" href="#contact">{"Get In Touch"}</a>
            </div>
            <ul class="achievements">
                { for ACHIEVEMENTS.iter().enumerate().map(|(index, item)| html! {
                    <li key={item.label}>
                        <Card3D visible={visible} delay={stagger_delay(index)}>
                            <span aria-hidden="true">{item.icon}</span>
                            <strong>{item.value}</strong>
                            <span class="muted">{item.label}</span>
                        </Card3D>
                    </li>
                }) }
            </ul>
            <ul class="tech-stack" aria-label="Tech stack">
                { for TECH_STACK.iter().map(|(name, badge)| html! {
                    <li key={*name} title={*name}><span aria-hidden="true">{*badge}</span>{*name}</li>
                }) }
            </ul>
            <GithubStatsBadge />
        </section>
    }
}

#[function_component(AboutSection)]
fn about_section() -> Html {
    let (node, visible) = use_reveal();

    html! {
        <section id="about" ref={node} class={classes!("section-block", visible.then_some("is-visible"))}>
            <h2>{"About Me"}</h2>
            <p>
                {"Full-stack developer building MERN and Laravel applications, from secure REST APIs to responsive interfaces. "}
                {"I care about measurable outcomes: faster queries, safer authentication and projects delivered on time."}
            </p>
            <ul class="quick-facts">
                { for QUICK_FACTS.iter().enumerate().map(|(index, fact)| html! {
                    <li key={fact.label}>
                        <Card3D visible={visible} delay={stagger_delay(index)}>
                            <span aria-hidden="true">{fact.icon}</span>
                            <span class="muted">{fact.label}</span>
                            <strong>{fact.value}</strong>
                        </Card3D>
                    </li>
                }) }
            </ul>
        </section>
    }
}

#[function_component(ServicesSection)]
fn services_section() -> Html {
    let (node, visible) = use_reveal();

    html! {
        <section id="services" ref={node} class={classes!("section-block", visible.then_some("is-visible"))}>
            <h2>{"Services"}</h2>
            <div class="card-grid">
                { for SERVICES.iter().enumerate().map(|(index, service)| html! {
                    <Card3D key={service.name} visible={visible} delay={stagger_delay(index)} class={classes!("service-card")}>
                        <span class="service-icon" aria-hidden="true">{service.icon}</span>
                        <h3>{service.name}</h3>
                        <p>{service.description}</p>
                    </Card3D>
                }) }
            </div>
        </section>
    }
}

fn render_skill_bars(skills: &[Skill], visible: bool) -> Html {
    html! {
        <ul class="skill-bars">
            { for skills.iter().map(|skill| {
                let width = if visible { skill.level } else { 0 };
                html! {
                    <li key={skill.name}>
                        <div class="skill-label">
                            <span aria-hidden="true">{skill.icon}</span>
                            <span>{skill.name}</span>
                            <span class="muted">{skill.category}</span>
                            <span>{format!("{}%", skill.level)}</span>
                        </div>
                        <div class="skill-track" role="progressbar" aria-valuenow={skill.level.to_string()} aria-valuemin="0" aria-valuemax="100">
                            <div class="skill-fill" style={format!("width: {width}%;")}></div>
                        </div>
                    </li>
                }
            }) }
        </ul>
    }
}

#[function_component(SkillsSection)]
fn skills_section() -> Html {
    let (node, visible) = use_reveal();

    html! {
        <section id="skills" ref={node} class={classes!("section-block", visible.then_some("is-visible"))}>
            <h2>{"Skills"}</h2>
            <div class="skill-columns">
                <div>
                    <h3>{"Technical"}</h3>
                    {render_skill_bars(&TECHNICAL_SKILLS, visible)}
                </div>
                <div>
                    <h3>{"Soft Skills"}</h3>
                    {render_skill_bars(&SOFT_SKILLS, visible)}
                </div>
            </div>
        </section>
    }
}

#[function_component(ProjectsSection)]
fn projects_section() -> Html {
    let (node, visible) = use_reveal();
    let filter = use_state_eq(ProjectFilter::default);

    let chips = ProjectFilter::CHOICES.iter().map(|choice| {
        let choice = *choice;
        let onclick = {
            let filter = filter.clone();
            Callback::from(move |_: MouseEvent| filter.set(choice))
        };

        html! {
            <button
                key={choice.label()}
                type="button"
                class={classes!("filter-chip", (*filter == choice).then_some("is-active"))}
                aria-pressed={(*filter == choice).to_string()}
                onclick={onclick}
            >
                {choice.label()}
                <span class="count">{choice.count(&PROJECTS).to_string()}</span>
            </button>
        }
    });

    let selected = *filter;
    let cards = PROJECTS
        .iter()
        .filter(|project| selected.accepts(project))
        .enumerate()
        .map(|(index, project)| {
            html! {
                <Card3D key={project.title} visible={visible} delay={stagger_delay(index)} class={classes!("project-card")}>
                    <div class="project-meta">
                        <span class="badge">{project.category.as_str()}</span>
                        <span class="muted">{format!("{} · {}", project.year, project.status)}</span>
                    </div>
                    <h3>{project.title}</h3>
                    <p>{project.description}</p>
                    <ul class="feature-list">
                        { for project.features.iter().map(|feature| html! { <li key={*feature}>{*feature}</li> }) }
                    </ul>
                    <ul class="tag-list">
                        { for project.technologies.iter().map(|tech| html! { <li key={*tech}>{*tech}</li> }) }
                    </ul>
                    <div class="project-links">
                        if let Some(live) = project.links.live {
                            <a href={live} target="_blank" rel="noopener noreferrer">{"Live Demo"}</a>
                        }
                        <a href={project.links.github} target="_blank" rel="noopener noreferrer">{"GitHub"}</a>
                    </div>
                </Card3D>
            }
        });

    html! {
        <section id="projects" ref={node} class={classes!("section-block", visible.then_some("is-visible"))}>
            <h2>{"Projects"}</h2>
            <div class="filter-bar" role="group" aria-label="Filter projects">
                { for chips }
            </div>
            <div class="card-grid">
                { for cards }
            </div>
            <a class="view-all" href={GITHUB_PROFILE_URL} target="_blank" rel="noopener noreferrer">
                {"View All on GitHub"}
            </a>
        </section>
    }
}

#[function_component(ExperienceSection)]
fn experience_section() -> Html {
    let (node, visible) = use_reveal();

    html! {
        <section id="experience" ref={node} class={classes!("section-block", visible.then_some("is-visible"))}>
            <h2>{"Experience"}</h2>
            { for EXPERIENCE.iter().enumerate().map(|(index, job)| html! {
                <Card3D key={job.company} visible={visible} delay={stagger_delay(index)} class={classes!("experience-card")}>
                    <h3>{job.role}</h3>
                    <p class="muted">{format!("{} · {}", job.company, job.period)}</p>
                    <ul>
                        { for job.achievements.iter().map(|item| html! { <li key={*item}>{*item}</li> }) }
                    </ul>
                </Card3D>
            }) }
        </section>
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ContactStatus {
    Idle,
    Sending,
    Success,
    Error,
}

impl ContactStatus {
    fn message(self) -> Option<&'static str> {
        match self {
            Self::Success => Some(CONTACT_SENT_MESSAGE),
            Self::Error => Some(CONTACT_FAILED_MESSAGE),
            Self::Idle | Self::Sending => None,
        }
    }
}

#[derive(Serialize)]
struct ContactRequest {
    name: String,
    email: String,
    message: String,
}

#[derive(Deserialize)]
struct ContactResponse {
    ok: bool,
}

async fn send_contact(request: &ContactRequest) -> bool {
    let Ok(pending) = Request::post("/api/contact").json(request) else {
        return false;
    };
    let Ok(response) = pending.send().await else {
        return false;
    };

    if !response.ok() {
        return false;
    }

    response
        .json::<ContactResponse>()
        .await
        .map(|payload| payload.ok)
        .unwrap_or(false)
}

#[function_component(ContactForm)]
fn contact_form() -> Html {
    let status = use_state_eq(|| ContactStatus::Idle);
    let form = use_node_ref();
    let name = use_node_ref();
    let email = use_node_ref();
    let message = use_node_ref();

    let onsubmit = {
        let status = status.clone();
        let form = form.clone();
        let name = name.clone();
        let email = email.clone();
        let message = message.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();

            if *status == ContactStatus::Sending {
                return;
            }

            let input_value = |node: &NodeRef| {
                node.cast::<HtmlInputElement>()
                    .map(|input| input.value())
                    .unwrap_or_default()
            };
            let request = ContactRequest {
                name: input_value(&name),
                email: input_value(&email),
                message: message
                    .cast::<HtmlTextAreaElement>()
                    .map(|area| area.value())
                    .unwrap_or_default(),
            };

            status.set(ContactStatus::Sending);
            let status = status.clone();
            let form = form.cast::<HtmlFormElement>();
            spawn_local(async move {
                if send_contact(&request).await {
                    if let Some(form) = form {
                        form.reset();
                    }
                    status.set(ContactStatus::Success);
                } else {
                    status.set(ContactStatus::Error);
                }
            });
        })
    };

    let sending = *status == ContactStatus::Sending;

    html! {
        <form ref={form} class="contact-form" onsubmit={onsubmit}>
            <label>
                {"Name"}
                <input ref={name} type="text" name="name" autocomplete="name" required=true />
            </label>
            <label>
                {"Email"}
                <input ref={email} type="email" name="email" autocomplete="email" required=true />
            </label>
            <label>
                {"Message"}
                <textarea ref={message} name="message" rows="5" required=true></textarea>
            </label>
            <button class="button primary" type="submit" disabled={sending}>
                {if sending { "Sending..." } else { "Send Message" }}
            </button>
            if let Some(text) = status.message() {
                <p
                    class={classes!("form-status", (*status == ContactStatus::Error).then_some("is-error"))}
                    role="status"
                >
                    {text}
                </p>
            }
        </form>
    }
}

#[function_component(ContactSection)]
fn contact_section() -> Html {
    let (node, visible) = use_reveal();

    html! {
        <section id="contact" ref={node} class={classes!("section-block", visible.then_some("is-visible"))}>
            <h2>{"Get In Touch"}</h2>
            <div class="contact-layout">
                <ul class="contact-details">
                    { for CONTACT_DETAILS.iter().enumerate().map(|(index, detail)| html! {
                        <li key={detail.label}>
                            <Card3D visible={visible} delay={stagger_delay(index)}>
                                <span aria-hidden="true">{detail.icon}</span>
                                <span class="muted">{detail.label}</span>
                                <a href={detail.href}>{detail.value}</a>
                            </Card3D>
                        </li>
                    }) }
                </ul>
                <ContactForm />
            </div>
        </section>
    }
}

#[function_component(App)]
fn app() -> Html {
    html! {
        <>
            <a class="skip-link" href="#content">{"Skip to main content"}</a>
            <CodeRainBackdrop />
            <Navbar />
            <main id="content">
                <HeroSection />
                <AboutSection />
                <ServicesSection />
                <SkillsSection />
                <ProjectsSection />
                <ExperienceSection />
                <ContactSection />
            </main>
            <footer class="site-footer">
                <p class="muted">{format!("© {OWNER_NAME}")}</p>
            </footer>
        </>
    }
}

pub fn run() {
    yew::Renderer::<App>::with_root(
        window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("app"))
            .expect("missing #app mount point"),
    )
    .render();
}

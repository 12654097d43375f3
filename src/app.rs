//! Application state management
//!
//! This module contains the main application state, handling keyboard input,
//! data loading through the catalog client (and therefore through the
//! response cache), profile selection, and favorites.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::warn;

use crate::account::{
    FavoriteItem, FavoriteSet, FavoritesClient, Profile, ProfilesClient, Session,
};
use crate::catalog::{
    CastMember, CatalogClient, CatalogItem, Category, Genre, ItemDetail, MediaKind,
};
use crate::cli::StartupConfig;

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while fetching data
    Loading,
    /// Profile picker, shown when a session exists
    ProfileSelect,
    /// Catalog browse list
    Browse,
    /// Detail view for the opened item
    Detail,
}

/// Deferred work set by the key handler and executed by the event loop.
///
/// Key handling stays synchronous; anything that needs the network is
/// recorded here and applied with `App::apply` between draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// Load the current (kind, category) listing, cache-first
    LoadCatalog,
    /// Reload the current listing, bypassing the cache
    Refresh,
    /// Run a search for the given query
    Search(String),
    /// Open the detail view for an item
    OpenDetail { id: u64, kind: MediaKind },
    /// Activate the profile at this index and load its favorites
    SelectProfile(usize),
    /// Add or remove the item from the active profile's favorites
    ToggleFavorite { id: u64, kind: MediaKind },
}

/// Data backing the detail view
#[derive(Debug, Clone, Default)]
pub struct DetailView {
    pub id: u64,
    pub kind: MediaKind,
    pub detail: Option<ItemDetail>,
    /// Logo lookup result; `Some(None)` means "looked up, no logo"
    pub logo: Option<Option<String>>,
    pub cast: Vec<CastMember>,
    pub recommendations: Vec<CatalogItem>,
    /// Absolute poster URL, for copying out of the terminal
    pub poster_url: Option<String>,
    /// Absolute backdrop URL
    pub backdrop_url: Option<String>,
    pub scroll_offset: u16,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Media kind currently browsed
    pub media_kind: MediaKind,
    /// Category currently browsed
    pub category: Category,
    /// Items in the browse list
    pub items: Vec<CatalogItem>,
    /// Genre list for the current media kind
    pub genres: Vec<Genre>,
    /// Index of the selected item in the browse list
    pub selected_index: usize,
    /// Heading shown above the browse list
    pub list_title: String,
    /// Search input buffer; `Some` while the user is typing a query
    pub search_input: Option<String>,
    /// Whether the browse list currently shows search results
    pub showing_search: bool,
    /// Data for the detail view, when open
    pub detail: Option<DetailView>,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Transient status line (errors, confirmations)
    pub status: Option<String>,
    /// Timestamp of last network refresh
    pub last_refresh: Option<DateTime<Local>>,
    /// Profiles on the signed-in account
    pub profiles: Vec<Profile>,
    /// Cursor in the profile picker
    pub profile_index: usize,
    /// The profile favorites are tracked against
    pub active_profile: Option<Profile>,
    /// The active profile's favorites
    pub favorites: Vec<FavoriteItem>,
    /// Membership lookup over `favorites`
    pub favorite_set: FavoriteSet,
    /// Work queued by the key handler for the event loop
    pub pending: Option<PendingAction>,
    session: Option<Session>,
    catalog_client: CatalogClient,
    profiles_client: ProfilesClient,
    favorites_client: FavoritesClient,
}

impl App {
    /// Creates a new App instance with the given clients and startup
    /// configuration.
    pub fn new(
        catalog_client: CatalogClient,
        profiles_client: ProfilesClient,
        favorites_client: FavoritesClient,
        session: Option<Session>,
        config: StartupConfig,
    ) -> Self {
        Self {
            state: AppState::Loading,
            should_quit: false,
            media_kind: config.media_kind,
            category: config.category,
            items: Vec::new(),
            genres: Vec::new(),
            selected_index: 0,
            list_title: String::new(),
            search_input: None,
            showing_search: false,
            detail: None,
            show_help: false,
            status: None,
            last_refresh: None,
            profiles: Vec::new(),
            profile_index: 0,
            active_profile: None,
            favorites: Vec::new(),
            favorite_set: FavoriteSet::default(),
            pending: None,
            session,
            catalog_client,
            profiles_client,
            favorites_client,
        }
    }

    /// Initial data load: profiles when signed in, then the first listing.
    pub async fn init(&mut self) {
        if let Some(session) = self.session.clone() {
            match self.profiles_client.list(&session).await {
                Ok(profiles) if !profiles.is_empty() => {
                    self.profiles = profiles;
                    self.state = AppState::ProfileSelect;
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "failed to load profiles");
                    self.status = Some("Could not load profiles; browsing without one".into());
                }
            }
        }
        self.load_genres().await;
        self.load_catalog().await;
        self.state = AppState::Browse;
    }

    /// Executes a deferred action queued by the key handler.
    pub async fn apply(&mut self, action: PendingAction) {
        match action {
            PendingAction::LoadCatalog => {
                self.load_genres_if_empty().await;
                self.load_catalog().await;
            }
            PendingAction::Refresh => self.refresh_catalog().await,
            PendingAction::Search(query) => self.run_search(&query).await,
            PendingAction::OpenDetail { id, kind } => self.open_detail(id, kind).await,
            PendingAction::SelectProfile(index) => {
                self.select_profile(index).await;
                self.load_genres_if_empty().await;
                self.load_catalog().await;
                self.state = AppState::Browse;
            }
            PendingAction::ToggleFavorite { id, kind } => self.toggle_favorite(id, kind).await,
        }
    }

    /// Loads the current (kind, category) listing, cache-first.
    pub async fn load_catalog(&mut self) {
        match self
            .catalog_client
            .fetch_catalog(self.media_kind, self.category)
            .await
        {
            Ok(items) => {
                self.items = items;
                self.selected_index = 0;
                self.showing_search = false;
                self.list_title = self.category_title();
                self.status = None;
            }
            Err(e) => {
                warn!(error = %e, "failed to load catalog");
                self.items = Vec::new();
                self.status = Some("Could not load the catalog; check your connection".into());
            }
        }
    }

    /// Reloads the current listing from the network, bypassing the cache.
    pub async fn refresh_catalog(&mut self) {
        match self
            .catalog_client
            .refresh_catalog(self.media_kind, self.category)
            .await
        {
            Ok(items) => {
                self.items = items;
                self.selected_index = self.selected_index.min(self.items.len().saturating_sub(1));
                self.showing_search = false;
                self.list_title = self.category_title();
                self.last_refresh = Some(Local::now());
                self.status = None;
            }
            Err(e) => {
                warn!(error = %e, "refresh failed");
                self.status = Some("Refresh failed; showing previous results".into());
            }
        }
    }

    /// Runs a search and shows its results in the browse list.
    pub async fn run_search(&mut self, query: &str) {
        match self.catalog_client.search(self.media_kind, query).await {
            Ok(items) => {
                let noun = match self.media_kind {
                    MediaKind::Movie => "Films",
                    MediaKind::Tv => "TV Shows",
                };
                self.list_title = format!("{} matching \"{}\"", noun, query);
                self.items = items;
                self.selected_index = 0;
                self.showing_search = true;
                self.status = None;
            }
            Err(e) => {
                warn!(error = %e, "search failed");
                self.status = Some("Search failed; check your connection".into());
            }
        }
    }

    /// Opens the detail view, fetching detail, logo, credits, and
    /// recommendations in parallel. Detail and logo go through the cache.
    pub async fn open_detail(&mut self, id: u64, kind: MediaKind) {
        let (detail, logo, cast, recommendations) = tokio::join!(
            self.catalog_client.fetch_detail(id, kind),
            self.catalog_client.fetch_logo(id, kind),
            self.catalog_client.fetch_credits(id, kind),
            self.catalog_client.fetch_recommendations(id, kind),
        );

        let detail_value = match detail {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(error = %e, id, "failed to load item detail");
                self.status = Some("Could not load details for this title".into());
                None
            }
        };

        let poster_url = detail_value
            .as_ref()
            .and_then(|d| d.poster_path.as_deref())
            .map(|path| self.catalog_client.poster_url(path));
        let backdrop_url = detail_value
            .as_ref()
            .and_then(|d| d.backdrop_path.as_deref())
            .map(|path| self.catalog_client.backdrop_url(path));

        self.detail = Some(DetailView {
            id,
            kind,
            detail: detail_value,
            logo: logo.ok(),
            cast: cast.unwrap_or_default(),
            recommendations: recommendations.unwrap_or_default(),
            poster_url,
            backdrop_url,
            scroll_offset: 0,
        });
        self.state = AppState::Detail;
    }

    /// Activates a profile and loads its favorites.
    pub async fn select_profile(&mut self, index: usize) {
        let Some(profile) = self.profiles.get(index).cloned() else {
            return;
        };
        if let Some(session) = self.session.clone() {
            match self.favorites_client.list(&session, &profile.id).await {
                Ok(favorites) => {
                    self.favorite_set = FavoriteSet::from_items(&favorites);
                    self.favorites = favorites;
                }
                Err(e) => {
                    warn!(error = %e, "failed to load favorites");
                    self.favorites = Vec::new();
                    self.favorite_set = FavoriteSet::default();
                    self.status = Some("Could not load favorites".into());
                }
            }
        }
        self.active_profile = Some(profile);
    }

    /// Adds or removes an item from the active profile's favorites.
    pub async fn toggle_favorite(&mut self, id: u64, kind: MediaKind) {
        let (Some(session), Some(profile)) = (self.session.clone(), self.active_profile.clone())
        else {
            self.status = Some("Sign in and pick a profile to save favorites".into());
            return;
        };

        if self.favorite_set.contains(id, kind) {
            match self
                .favorites_client
                .remove(&session, &profile.id, id, kind)
                .await
            {
                Ok(()) => {
                    self.favorite_set.remove(id, kind);
                    self.favorites
                        .retain(|f| !(f.item_id == id && f.kind == kind));
                    self.status = Some("Removed from favorites".into());
                }
                Err(e) => {
                    warn!(error = %e, "failed to remove favorite");
                    self.status = Some("Could not remove favorite".into());
                }
            }
            return;
        }

        let Some(item) = self.item_snapshot(id, kind) else {
            return;
        };
        let favorite = FavoriteItem::from_catalog(&item, kind);
        match self
            .favorites_client
            .add(&session, &profile.id, self.favorites.len(), &favorite)
            .await
        {
            Ok(()) => {
                self.favorite_set.insert(id, kind);
                self.favorites.push(favorite);
                self.status = Some("Added to favorites".into());
            }
            Err(e) => {
                warn!(error = %e, "failed to add favorite");
                self.status = Some(e.to_string());
            }
        }
    }

    async fn load_genres(&mut self) {
        match self.catalog_client.fetch_genres(self.media_kind).await {
            Ok(genres) => self.genres = genres,
            Err(e) => warn!(error = %e, "failed to load genres"),
        }
    }

    async fn load_genres_if_empty(&mut self) {
        if self.genres.is_empty() {
            self.load_genres().await;
        }
    }

    /// Returns the currently selected browse item, if any.
    pub fn selected_item(&self) -> Option<&CatalogItem> {
        self.items.get(self.selected_index)
    }

    /// Whether an item is in the active profile's favorites.
    pub fn is_favorite(&self, id: u64, kind: MediaKind) -> bool {
        self.favorite_set.contains(id, kind)
    }

    /// Resolves a genre id to its display name, once genres are loaded.
    pub fn genre_name(&self, id: u32) -> Option<&str> {
        self.genres
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.name.as_str())
    }

    fn category_title(&self) -> String {
        let genre_name = match self.category {
            Category::Genre(id) => self.genre_name(id).map(str::to_string),
            _ => None,
        };
        self.category
            .display_name(self.media_kind, genre_name.as_deref())
    }

    /// Finds a display snapshot for an item: the browse list first, then the
    /// open detail view's recommendations, then the detail record itself.
    fn item_snapshot(&self, id: u64, kind: MediaKind) -> Option<CatalogItem> {
        if let Some(item) = self.items.iter().find(|i| i.id == id) {
            return Some(item.clone());
        }
        if let Some(view) = &self.detail {
            if let Some(item) = view.recommendations.iter().find(|i| i.id == id) {
                return Some(item.clone());
            }
            if view.id == id && view.kind == kind {
                if let Some(detail) = &view.detail {
                    return Some(CatalogItem {
                        id: detail.id,
                        title: detail.title.clone(),
                        overview: detail.overview.clone(),
                        poster_path: detail.poster_path.clone(),
                        backdrop_path: detail.backdrop_path.clone(),
                        vote_average: detail.vote_average,
                        release_date: detail.release_date,
                        genre_ids: detail.genres.iter().map(|g| g.id).collect(),
                    });
                }
            }
        }
        None
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q`: Quit (outside search input)
    /// - `Up`/`k`, `Down`/`j`: Move selection
    /// - `Enter`: Open detail / submit search / pick profile
    /// - `t`: Toggle between movies and TV
    /// - `c`: Cycle through the fixed categories
    /// - `/`: Start a search
    /// - `f`: Toggle favorite for the selected item
    /// - `r`: Refresh the current listing, bypassing the cache
    /// - `p`: Back to the profile picker (when signed in)
    /// - `?`: Toggle help overlay
    /// - `Esc`: Close overlay / cancel search / go back
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        // Search input mode intercepts everything else
        if self.search_input.is_some() {
            self.handle_search_key(key_event);
            return;
        }

        match self.state {
            AppState::Loading => {
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::ProfileSelect => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_profile_cursor_up();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_profile_cursor_down();
                }
                KeyCode::Enter => {
                    self.pending = Some(PendingAction::SelectProfile(self.profile_index));
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::Browse => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc => {
                    // Esc leaves search results; otherwise it quits
                    if self.showing_search {
                        self.pending = Some(PendingAction::LoadCatalog);
                    } else {
                        self.should_quit = true;
                    }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_selection_up();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_selection_down();
                }
                KeyCode::Enter => {
                    if let Some(item) = self.selected_item() {
                        self.pending = Some(PendingAction::OpenDetail {
                            id: item.id,
                            kind: self.media_kind,
                        });
                    }
                }
                KeyCode::Char('t') => {
                    self.toggle_media_kind();
                }
                KeyCode::Char('c') => {
                    self.cycle_category();
                }
                KeyCode::Char('/') => {
                    self.search_input = Some(String::new());
                }
                KeyCode::Char('f') => {
                    if let Some(item) = self.selected_item() {
                        self.pending = Some(PendingAction::ToggleFavorite {
                            id: item.id,
                            kind: self.media_kind,
                        });
                    }
                }
                KeyCode::Char('r') => {
                    self.pending = Some(PendingAction::Refresh);
                }
                KeyCode::Char('p') => {
                    if !self.profiles.is_empty() {
                        self.state = AppState::ProfileSelect;
                    }
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::Detail => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                    self.detail = None;
                    self.state = AppState::Browse;
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if let Some(view) = &mut self.detail {
                        view.scroll_offset = view.scroll_offset.saturating_add(1);
                    }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    if let Some(view) = &mut self.detail {
                        view.scroll_offset = view.scroll_offset.saturating_sub(1);
                    }
                }
                KeyCode::Char('f') => {
                    if let Some(view) = &self.detail {
                        self.pending = Some(PendingAction::ToggleFavorite {
                            id: view.id,
                            kind: view.kind,
                        });
                    }
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
        }
    }

    fn handle_search_key(&mut self, key_event: KeyEvent) {
        let Some(input) = &mut self.search_input else {
            return;
        };
        match key_event.code {
            KeyCode::Esc => {
                self.search_input = None;
            }
            KeyCode::Enter => {
                let query = input.trim().to_string();
                self.search_input = None;
                if !query.is_empty() {
                    self.pending = Some(PendingAction::Search(query));
                }
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => {
                input.push(c);
            }
            _ => {}
        }
    }

    /// Switches between movies and TV, falling back to Popular when the
    /// current category does not exist for the other kind.
    fn toggle_media_kind(&mut self) {
        self.media_kind = self.media_kind.toggled();
        if !self.category.applies_to(self.media_kind) {
            self.category = Category::Popular;
        }
        // Genre ids differ between kinds; the new list loads with the kind
        self.genres.clear();
        self.pending = Some(PendingAction::LoadCatalog);
    }

    /// Cycles Popular -> TopRated -> NowPlaying/OnAir -> Popular.
    fn cycle_category(&mut self) {
        self.category = match (self.category, self.media_kind) {
            (Category::Popular, _) => Category::TopRated,
            (Category::TopRated, MediaKind::Movie) => Category::NowPlaying,
            (Category::TopRated, MediaKind::Tv) => Category::OnAir,
            _ => Category::Popular,
        };
        self.pending = Some(PendingAction::LoadCatalog);
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.items.len();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.items.len();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    fn move_profile_cursor_up(&mut self) {
        let count = self.profiles.len();
        if count == 0 {
            return;
        }
        if self.profile_index == 0 {
            self.profile_index = count - 1;
        } else {
            self.profile_index -= 1;
        }
    }

    fn move_profile_cursor_down(&mut self) {
        let count = self.profiles.len();
        if count == 0 {
            return;
        }
        self.profile_index = (self.profile_index + 1) % count;
    }
}

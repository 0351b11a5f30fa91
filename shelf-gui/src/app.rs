use std::sync::Arc;

use eframe::egui::{self, Color32, Rounding, Stroke};
use shelf_core::{Book, CancelToken, LoadState, Shelf, ShelfError, ShelfLoader, ShelfView};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const MAX_LIMIT: usize = 40;
const SUMMARY_CHARS: usize = 160;
const CARD_WIDTH: f32 = 230.0;

pub struct AppInit {
    pub runtime: Arc<Runtime>,
    pub loader: Arc<ShelfLoader>,
    pub profile_url: String,
    pub limit: usize,
}

struct Finished {
    token: CancelToken,
    result: Result<Vec<Book>, ShelfError>,
}

pub struct ShelfApp {
    runtime: Arc<Runtime>,
    loader: Arc<ShelfLoader>,
    profile_url: String,
    view: ShelfView,
    selected: Shelf,
    limit: usize,
    results_tx: mpsc::Sender<Finished>,
    results_rx: mpsc::Receiver<Finished>,
}

impl ShelfApp {
    pub fn new(init: AppInit) -> Self {
        let (results_tx, results_rx) = mpsc::channel(16);
        let selected = Shelf::default();
        Self {
            runtime: init.runtime,
            loader: init.loader,
            profile_url: init.profile_url,
            view: ShelfView::new(selected, init.limit),
            selected,
            limit: init.limit.clamp(1, MAX_LIMIT),
            results_tx,
            results_rx,
        }
    }

    /// Kicks off a load for the current inputs. Any load still in flight is
    /// left to finish but its result will be discarded.
    fn start_load(&mut self, ctx: &egui::Context) {
        let token = self.view.begin(self.selected, self.limit);
        let loader = self.loader.clone();
        let tx = self.results_tx.clone();
        let ctx = ctx.clone();
        let (shelf, limit) = (self.selected, self.limit);

        self.runtime.spawn(async move {
            let result = loader.load(shelf, limit).await;
            if tx.send(Finished { token, result }).await.is_err() {
                warn!("shelf window closed before the load finished");
            }
            ctx.request_repaint();
        });
    }

    fn drain_results(&mut self) {
        while let Ok(done) = self.results_rx.try_recv() {
            if !self.view.commit(&done.token, done.result) {
                debug!("ignored a superseded shelf load");
            }
        }
    }

    fn open_link(url: &str) {
        if let Err(e) = webbrowser::open(url) {
            warn!(url, error = %e, "failed to open link");
        }
    }

    fn draw_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("shelf_toolbar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading(egui::RichText::new("📚 Goodreads").size(18.0));
                ui.separator();
                for shelf in Shelf::ALL {
                    ui.selectable_value(&mut self.selected, shelf, shelf.label());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⟳ Refresh").clicked() {
                        self.start_load(ctx);
                    }
                    ui.add(egui::Slider::new(&mut self.limit, 1..=MAX_LIMIT).text("books"));
                });
            });
            ui.add_space(4.0);
        });
    }

    fn draw_footer(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("shelf_footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(self.view.shelf().label().to_uppercase())
                        .weak()
                        .size(12.0),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("See everything on Goodreads →").clicked() {
                        Self::open_link(&self.profile_url);
                    }
                });
            });
        });
    }

    fn draw_rail(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(message) = self.view.error_message() {
                self.draw_error(ui, message);
                return;
            }

            match self.view.state() {
                LoadState::Idle | LoadState::Loading => {
                    ui.vertical_centered(|ui| {
                        ui.add_space(80.0);
                        ui.spinner();
                        ui.label(egui::RichText::new("Loading shelf…").weak());
                    });
                }
                LoadState::Ready(books) if books.is_empty() => {
                    ui.vertical_centered(|ui| {
                        ui.add_space(80.0);
                        ui.label(
                            egui::RichText::new("Nothing to show on this shelf just yet. Check back soon.")
                                .size(15.0),
                        );
                    });
                }
                LoadState::Ready(books) => {
                    egui::ScrollArea::horizontal()
                        .auto_shrink([false, true])
                        .show(ui, |ui| {
                            ui.horizontal_top(|ui| {
                                for book in books {
                                    self.draw_card(ui, book);
                                }
                            });
                        });
                }
                LoadState::Error(_) => {}
            }
        });
    }

    fn draw_error(&self, ui: &mut egui::Ui, message: &str) {
        let red = Color32::from_rgb(229, 57, 53);
        egui::Frame::group(ui.style())
            .stroke(Stroke::new(1.0, red))
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Couldn't reach Goodreads right now.").color(red));
                if ui.link("Open my shelf on Goodreads →").clicked() {
                    Self::open_link(&self.profile_url);
                }
                ui.label(egui::RichText::new(message).weak().size(12.0));
            });
    }

    fn draw_card(&self, ui: &mut egui::Ui, book: &Book) {
        ui.group(|ui| {
            ui.set_width(CARD_WIDTH);
            ui.vertical(|ui| {
                ui.label(
                    egui::RichText::new(book.status().to_uppercase())
                        .size(11.0)
                        .color(Color32::from_rgb(0, 122, 204)),
                );
                ui.label(egui::RichText::new(&book.title).strong().size(15.0));
                if !book.author.is_empty() {
                    ui.label(egui::RichText::new(&book.author).weak().size(13.0));
                }

                match book.display_rating() {
                    Some(rating) => {
                        let filled = rating.round().clamp(0.0, 5.0) as usize;
                        let stars = format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled));
                        ui.label(
                            egui::RichText::new(format!("{stars} {rating:.1}"))
                                .color(Color32::from_rgb(255, 193, 7)),
                        );
                    }
                    None => {
                        ui.label(egui::RichText::new("No rating yet").weak().size(12.0));
                    }
                }

                if let Some(pages) = book.pages {
                    ui.label(egui::RichText::new(format!("{pages} pages")).weak().size(12.0));
                }
                if !book.summary.is_empty() {
                    ui.label(egui::RichText::new(book.summary_excerpt(SUMMARY_CHARS)).size(12.0));
                }

                let target = if book.link.is_empty() {
                    &self.profile_url
                } else {
                    &book.link
                };
                if ui
                    .small_button("🔗 Open")
                    .on_hover_text(format!("Open {} on Goodreads", book.title))
                    .clicked()
                {
                    Self::open_link(target);
                }
            });
        });
    }
}

pub fn setup_dark_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    let panel_color = Color32::from_rgb(24, 24, 27);
    let border_color = Color32::from_rgb(62, 62, 66);
    let text_color = Color32::from_rgb(220, 220, 220);

    style.visuals.dark_mode = true;
    style.visuals.panel_fill = panel_color;
    style.visuals.window_fill = panel_color;
    style.visuals.override_text_color = Some(text_color);
    style.visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, border_color);
    style.visuals.widgets.noninteractive.rounding = Rounding::same(8.0);
    style.visuals.widgets.inactive.rounding = Rounding::same(4.0);
    style.visuals.widgets.hovered.rounding = Rounding::same(4.0);
    style.visuals.widgets.active.rounding = Rounding::same(4.0);

    style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);

    ctx.set_style(style);
}

impl eframe::App for ShelfApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_results();
        if self.view.needs_load(self.selected, self.limit) {
            self.start_load(ctx);
        }

        self.draw_toolbar(ctx);
        self.draw_footer(ctx);
        self.draw_rail(ctx);
    }
}

impl Drop for ShelfApp {
    fn drop(&mut self) {
        self.view.cancel();
    }
}

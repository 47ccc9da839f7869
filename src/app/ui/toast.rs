use std::collections::VecDeque;

use eframe::egui::{self, Align2, Color32, Context, RichText, vec2};

const TOAST_SECONDS: f64 = 4.0;
const MAX_TOASTS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum ToastLevel {
    Success,
    Error,
}

struct Toast {
    level: ToastLevel,
    text: String,
    shown_since: Option<f64>,
}

/// Transient notifications stacked in the bottom-right corner.
#[derive(Default)]
pub(in crate::app) struct Toasts {
    items: VecDeque<Toast>,
}

impl Toasts {
    pub(in crate::app) fn push(&mut self, level: ToastLevel, text: impl Into<String>) {
        if self.items.len() == MAX_TOASTS {
            self.items.pop_front();
        }
        self.items.push_back(Toast {
            level,
            text: text.into(),
            shown_since: None,
        });
    }

    pub(in crate::app) fn success(&mut self, text: impl Into<String>) {
        self.push(ToastLevel::Success, text);
    }

    pub(in crate::app) fn error(&mut self, text: impl Into<String>) {
        self.push(ToastLevel::Error, text);
    }

    fn expire(&mut self, now: f64) {
        for toast in &mut self.items {
            toast.shown_since.get_or_insert(now);
        }
        self.items.retain(|toast| {
            toast
                .shown_since
                .is_some_and(|since| now - since < TOAST_SECONDS)
        });
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        let now = ctx.input(|input| input.time);
        self.expire(now);
        if self.items.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_BOTTOM, vec2(-12.0, -12.0))
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &self.items {
                    let (fill, text_color) = match toast.level {
                        ToastLevel::Success => (
                            Color32::from_rgb(0xe8, 0xf8, 0xee),
                            Color32::from_rgb(0x1e, 0x84, 0x49),
                        ),
                        ToastLevel::Error => (
                            Color32::from_rgb(0xfd, 0xed, 0xec),
                            Color32::from_rgb(0xc0, 0x39, 0x2b),
                        ),
                    };
                    egui::Frame::popup(ui.style()).fill(fill).show(ui, |ui| {
                        ui.label(RichText::new(&toast.text).color(text_color));
                    });
                    ui.add_space(4.0);
                }
            });

        ctx.request_repaint_after(std::time::Duration::from_millis(250));
    }
}

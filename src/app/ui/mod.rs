mod controls;
mod details;
mod panels;
mod toast;

pub(super) use toast::Toasts;

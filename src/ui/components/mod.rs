pub mod ad_modal;
pub mod confirm_dialog;
pub mod menu;
pub mod progress_bar;
pub mod question_card;
pub mod result_screen;

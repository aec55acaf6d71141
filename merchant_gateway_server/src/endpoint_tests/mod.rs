mod callbacks;
mod helpers;
mod orders;

mod helpers;
mod test_synthesis;

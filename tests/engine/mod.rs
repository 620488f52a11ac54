mod tests_backfill;
mod tests_backtracking;
mod tests_cooked;
mod tests_emission;
mod tests_errors;

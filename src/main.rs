use std::process::ExitCode;

fn main() -> ExitCode {
  workout_planner::run()
}

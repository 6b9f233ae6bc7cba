pub mod feedback;
pub mod user;
pub mod workout;

pub use feedback::{DailyWorkoutFeedback, Difficulty, ExerciseFeedback, Soreness};
pub use user::{ExperienceLevel, FitnessGoal, Gender, GymStrength, HomeStrength, TrainingContext, UserProfile};
pub use workout::{DailyWorkout, Exercise, ExercisePayload, Reps, Weekday, Weight};

use std::io::{self, BufRead, Write};

use hygiene_core::model::{QuizSummary, TipCategory, UserStats};
use services::{SessionError, SessionManager};

/// How an interactive quiz ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Submitted,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Answer(usize),
    Next,
    Previous,
    Submit,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    match line.trim() {
        "n" | "next" => Some(Input::Next),
        "p" | "prev" | "previous" => Some(Input::Previous),
        "s" | "submit" => Some(Input::Submit),
        "q" | "quit" => Some(Input::Quit),
        other => other
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .map(Input::Answer),
    }
}

fn show_question(manager: &SessionManager, out: &mut impl Write) -> io::Result<()> {
    let Some(quiz) = manager.current() else {
        return Ok(());
    };
    let Some(question) = quiz.current_question() else {
        return Ok(());
    };
    let position = quiz.current_index();
    let selected = quiz.answer_at(position);

    writeln!(out)?;
    writeln!(
        out,
        "Question {}/{}: {}",
        position + 1,
        quiz.total_questions(),
        question.text()
    )?;
    for (i, option) in question.options().iter().enumerate() {
        let marker = if selected == Some(i) { '*' } else { ' ' };
        writeln!(out, " {marker} {}) {option}", i + 1)?;
    }
    write!(out, "[1-{}] answer, n/p move, s submit, q quit > ", question.options().len())?;
    out.flush()
}

/// Drive the active quiz from line-oriented input until it is submitted,
/// abandoned or the input ends.
///
/// Submitting only ends the loop; completing the quiz is left to the caller.
///
/// # Errors
///
/// Returns `SessionError::NoActiveQuiz` without a quiz, or the I/O error of
/// `input`/`out` wrapped as a render error.
pub fn run_quiz(
    manager: &mut SessionManager,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Outcome, SessionError> {
    if manager.current().is_none() {
        return Err(SessionError::NoActiveQuiz);
    }

    let mut line = String::new();
    loop {
        show_question(manager, out).map_err(services::RenderError::from)?;
        line.clear();
        if input
            .read_line(&mut line)
            .map_err(services::RenderError::from)?
            == 0
        {
            return Ok(Outcome::Quit);
        }

        let option_count = manager
            .current()
            .and_then(|quiz| quiz.current_question())
            .map_or(0, |q| q.options().len());

        match parse_input(&line) {
            Some(Input::Answer(option)) if option < option_count => {
                manager.answer(option)?;
                manager.next()?;
            }
            Some(Input::Next) => {
                if !manager.next()? {
                    writeln!(out, "Already at the last question.")
                        .map_err(services::RenderError::from)?;
                }
            }
            Some(Input::Previous) => {
                if !manager.previous()? {
                    writeln!(out, "Already at the first question.")
                        .map_err(services::RenderError::from)?;
                }
            }
            Some(Input::Submit) => return Ok(Outcome::Submitted),
            Some(Input::Quit) => return Ok(Outcome::Quit),
            Some(Input::Answer(_)) | None => {
                writeln!(out, "Enter a number between 1 and {option_count}.")
                    .map_err(services::RenderError::from)?;
            }
        }
    }
}

pub fn print_summary(summary: &QuizSummary, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{} complete", summary.course_name)?;
    writeln!(
        out,
        "Score: {}/{} ({:.1}%), grade {}",
        summary.score, summary.total, summary.percentage, summary.grade
    )?;
    writeln!(out, "{}", summary.grade.description())?;
    writeln!(out, "Time: {} minutes", summary.duration_minutes)?;
    for miss in &summary.incorrect {
        writeln!(out)?;
        writeln!(out, "Q{}: {}", miss.position + 1, miss.question)?;
        writeln!(out, "  Correct answer: {}", miss.correct_option)?;
        if !miss.explanation.is_empty() {
            writeln!(out, "  {}", miss.explanation)?;
        }
    }
    Ok(())
}

pub fn print_stats(stats: &UserStats, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Statistics for {}", stats.user_name())?;
    writeln!(out, "  Quizzes taken:   {}", stats.total_sessions())?;
    writeln!(
        out,
        "  Correct answers: {}/{}",
        stats.total_correct(),
        stats.total_questions()
    )?;
    writeln!(out, "  Average score:   {:.1}%", stats.average_score())?;
    writeln!(
        out,
        "  Streak:          {} (best {})",
        stats.current_streak(),
        stats.longest_streak()
    )?;
    if let Some(at) = stats.last_session_at() {
        writeln!(out, "  Last quiz:       {}", at.format("%Y-%m-%d %H:%M"))?;
    }

    let breakdown = stats.category_breakdown();
    if !breakdown.is_empty() {
        writeln!(out)?;
        writeln!(out, "By category:")?;
        for row in breakdown {
            writeln!(
                out,
                "  {:<24} {:>3} correct over {:>2} quizzes",
                row.category, row.correct, row.attempts
            )?;
        }
    }
    Ok(())
}

pub fn print_tips(tips: &[TipCategory], out: &mut impl Write) -> io::Result<()> {
    for group in tips {
        writeln!(out, "{}", group.category)?;
        for tip in &group.tips {
            writeln!(out, "  {} {}", tip.icon, tip.title)?;
            writeln!(out, "     {}", tip.description)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

use vision_assist_rust::describer::SCENE_PROMPT;

// The prompt is part of the product surface: every description the user
// hears is shaped by it, so changes should be deliberate.
#[test]
fn scene_prompt_snapshot() {
    insta::assert_snapshot!("scene_prompt", SCENE_PROMPT);
}
